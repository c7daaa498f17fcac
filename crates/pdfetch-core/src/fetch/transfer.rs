//! Streamed GET with the `%PDF-` signature gate.
//!
//! The first `SIGNATURE_WINDOW` bytes are held in memory; nothing touches the
//! disk until they contain the PDF magic. Non-PDF bodies (HTML error pages,
//! login walls) abort the transfer before any file exists.

use std::cell::RefCell;
use std::path::Path;
use std::str;

use crate::config::FetchConfig;
use crate::fetch_head::{parse_headers, HeadResult};
use crate::storage::ArtifactWriter;
use crate::validate::{has_pdf_signature, SIGNATURE_WINDOW};

use super::{FetchError, FetchJob};

struct TransferState<'a> {
    dest: &'a Path,
    header_lines: Vec<String>,
    /// Bytes held back until the signature is confirmed.
    head: Vec<u8>,
    writer: Option<ArtifactWriter>,
    received: u64,
    probe_total: Option<u64>,
    total: Option<Option<u64>>,
    last_percent: Option<u8>,
    abort: Option<FetchError>,
}

impl<'a> TransferState<'a> {
    fn new(dest: &'a Path, probe: Option<&HeadResult>) -> Self {
        Self {
            dest,
            header_lines: Vec::new(),
            head: Vec::with_capacity(SIGNATURE_WINDOW),
            writer: None,
            received: 0,
            probe_total: probe.and_then(|h| h.content_length),
            total: None,
            last_percent: None,
            abort: None,
        }
    }

    /// GET's own Content-Length wins over the probe's.
    fn total(&mut self) -> Option<u64> {
        if self.total.is_none() {
            let declared = parse_headers(&self.header_lines).content_length;
            self.total = Some(declared.or(self.probe_total).filter(|n| *n > 0));
        }
        self.total.flatten()
    }

    fn accept(&mut self, data: &[u8], job: &FetchJob<'_>) -> Result<(), FetchError> {
        self.received += data.len() as u64;
        match self.writer.as_mut() {
            Some(writer) => writer
                .write_all(data)
                .map_err(|e| FetchError::Storage(format!("{:#}", e)))?,
            None => {
                self.head.extend_from_slice(data);
                if self.head.len() < SIGNATURE_WINDOW {
                    return Ok(());
                }
                self.open_gate(job)?;
            }
        }
        self.report_progress(job);
        Ok(())
    }

    /// Checks the held-back bytes and, if they are a PDF, starts the temp file.
    fn open_gate(&mut self, job: &FetchJob<'_>) -> Result<(), FetchError> {
        if !has_pdf_signature(&self.head) {
            tracing::warn!(id = job.record_id, "first chunk missing %PDF- signature");
            return Err(FetchError::NotAPdf);
        }
        let mut writer = ArtifactWriter::create(self.dest)
            .map_err(|e| FetchError::Storage(format!("{:#}", e)))?;
        writer
            .write_all(&self.head)
            .map_err(|e| FetchError::Storage(format!("{:#}", e)))?;
        self.head = Vec::new();
        self.writer = Some(writer);
        Ok(())
    }

    fn report_progress(&mut self, job: &FetchJob<'_>) {
        let Some(total) = self.total() else {
            return;
        };
        let percent = (self.received.saturating_mul(100) / total).min(100) as u8;
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            job.progress
                .worker(job.slot, format!("Downloading {}", job.record_id), percent);
        }
    }
}

fn configure(easy: &mut curl::easy::Easy, url: &str, cfg: &FetchConfig) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(cfg.max_redirections)?;
    // In-memory cookie jar so cookies set by a redirecting hop are replayed.
    easy.cookie_file("")?;
    easy.fail_on_error(true)?;
    easy.connect_timeout(cfg.connect_timeout())?;
    easy.low_speed_limit(1)?;
    easy.low_speed_time(cfg.transfer_timeout())?;
    if !cfg.user_agent.is_empty() {
        easy.useragent(&cfg.user_agent)?;
    }
    if cfg.accept_invalid_certs {
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
    }
    Ok(())
}

/// Streams `url` into `<dest>.part`. Returns the open writer once the whole
/// body passed the signature gate; the caller validates and finalizes it.
pub(super) fn stream_pdf(
    url: &str,
    dest: &Path,
    probe: Option<&HeadResult>,
    cfg: &FetchConfig,
    job: &FetchJob<'_>,
) -> Result<ArtifactWriter, FetchError> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, cfg).map_err(|e| FetchError::TransferError(e.to_string()))?;

    let state = RefCell::new(TransferState::new(dest, probe));
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    state.borrow_mut().header_lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(|e| FetchError::TransferError(e.to_string()))?;
        transfer
            .write_function(|data| {
                let mut st = state.borrow_mut();
                match st.accept(data, job) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        st.abort = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })
            .map_err(|e| FetchError::TransferError(e.to_string()))?;
        transfer.perform()
    };

    let mut state = state.into_inner();
    if let Some(reason) = state.abort.take() {
        return Err(reason);
    }
    if let Err(e) = performed {
        let detail = if e.is_http_returned_error() {
            match easy.response_code() {
                Ok(code) => format!("HTTP {} for url {}", code, url),
                Err(_) => e.to_string(),
            }
        } else {
            e.to_string()
        };
        tracing::warn!(id = job.record_id, url, "GET failed: {}", detail);
        return Err(FetchError::TransferError(detail));
    }
    let code = easy
        .response_code()
        .map_err(|e| FetchError::TransferError(e.to_string()))?;
    if !(200..300).contains(&code) {
        return Err(FetchError::TransferError(format!("HTTP {} for url {}", code, url)));
    }

    if state.writer.is_none() {
        // Body shorter than the signature window.
        if state.head.is_empty() {
            return Err(FetchError::EmptyFile);
        }
        state.open_gate(job)?;
        state.report_progress(job);
    }
    state.writer.take().ok_or(FetchError::EmptyFile)
}
