//! HTTP HEAD probing.
//!
//! Uses the curl crate (libcurl) to ask the origin what it would serve before
//! the GET: declared `Content-Length` and `Content-Type`. The result is only
//! advisory; the content itself decides whether an artifact is a PDF.

mod parse;

pub(crate) use parse::parse_headers;

use anyhow::{Context, Result};
use std::str;

use crate::config::FetchConfig;

/// Declared lengths below this are suspicious for a report PDF.
pub const SMALL_BODY_BYTES: u64 = 1000;

/// Key headers from a HEAD (or the header block of a GET).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Type` value, lower-cased, if present.
    pub content_type: Option<String>,
}

impl HeadResult {
    pub fn looks_like_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("text/html"))
    }

    pub fn looks_too_small(&self) -> bool {
        self.content_length.is_some_and(|n| n < SMALL_BODY_BYTES)
    }
}

/// Performs a HEAD request with the configured identity and returns parsed metadata.
///
/// Follows redirects. Runs in the current thread; call from `spawn_blocking`
/// if used from async code.
pub fn probe(url: &str, cfg: &FetchConfig) -> Result<HeadResult> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.max_redirections(cfg.max_redirections)?;
    easy.cookie_file("")?;
    easy.connect_timeout(cfg.connect_timeout().min(cfg.probe_timeout()))?;
    easy.timeout(cfg.probe_timeout())?;
    if !cfg.user_agent.is_empty() {
        easy.useragent(&cfg.user_agent)?;
    }
    if cfg.accept_invalid_certs {
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    Ok(parse_headers(&headers))
}
