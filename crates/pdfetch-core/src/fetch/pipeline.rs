//! libcurl-backed `Fetcher`.

use std::path::Path;

use crate::config::FetchConfig;
use crate::disk;
use crate::fetch_head::{self, HeadResult};
use crate::storage;
use crate::url_model::normalize_url;
use crate::validate;

use super::transfer::stream_pdf;
use super::{FetchError, FetchJob, FetchReport, Fetcher};

/// Production fetcher: HEAD probe and streamed GET through libcurl, then
/// structural validation with lopdf.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    cfg: FetchConfig,
}

impl CurlFetcher {
    pub fn new(cfg: FetchConfig) -> Self {
        Self { cfg }
    }

    fn check_space(&self, dest: &Path, id: &str) -> Result<(), FetchError> {
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let free = disk::free_space(dir).map_err(|e| {
            tracing::warn!(id, "could not check disk space: {}", e);
            FetchError::InsufficientSpace(format!("disk space check error: {}", e))
        })?;
        if free < self.cfg.min_free_bytes {
            let free_mib = free as f64 / 1_048_576.0;
            tracing::warn!(id, "low disk space ({:.2} MiB)", free_mib);
            return Err(FetchError::InsufficientSpace(format!(
                "{:.2} MiB free on {}",
                free_mib,
                dir.display()
            )));
        }
        Ok(())
    }

    /// HEAD is advisory: failures and suspicious answers are only logged.
    fn probe(&self, url: &str, id: &str) -> Option<HeadResult> {
        match fetch_head::probe(url, &self.cfg) {
            Ok(head) => {
                if head.looks_like_html() {
                    tracing::warn!(id, url, "HEAD suggests HTML; will still attempt GET");
                }
                if head.looks_too_small() {
                    tracing::warn!(id, url, length = head.content_length, "HEAD indicates a very small file");
                }
                Some(head)
            }
            Err(e) => {
                tracing::warn!(id, url, "HEAD request warning (non-fatal): {:#}", e);
                None
            }
        }
    }
}

fn storage_err(e: anyhow::Error) -> FetchError {
    FetchError::Storage(format!("{:#}", e))
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, dest: &Path, job: &FetchJob<'_>) -> Result<FetchReport, FetchError> {
        let id = job.record_id;
        let url = normalize_url(url).map_err(FetchError::InvalidUrl)?;

        // A leftover from a crashed run must not survive a failed attempt.
        storage::remove_if_exists(dest)
            .map_err(|e| FetchError::Storage(format!("remove stale {}: {}", dest.display(), e)))?;
        self.check_space(dest, id)?;

        let head = self.probe(&url, id);
        let mut writer = stream_pdf(&url, dest, head.as_ref(), &self.cfg, job)?;
        writer.sync().map_err(storage_err)?;

        let pages = validate::check_structure(writer.temp_path()).map_err(|msg| {
            tracing::warn!(id, url = %url, "PDF parse error: {}", msg);
            FetchError::StructuralError(msg)
        })?;
        let bytes = writer.bytes_written();
        writer.finalize().map_err(storage_err)?;

        tracing::info!(id, bytes, pages, "downloaded {}", dest.display());
        Ok(FetchReport { bytes, pages })
    }
}
