//! Fetch-and-validate pipeline for one URL.
//!
//! normalize → free-space check → HEAD probe (advisory) → streamed GET behind
//! a `%PDF-` signature gate → empty check → structural parse → rename into
//! place. Every failure leaves neither the artifact nor its `.part` file.

mod error;
mod pipeline;
mod transfer;

pub use error::FetchError;
pub use pipeline::CurlFetcher;

use std::path::Path;

use crate::progress::{ProgressSink, WorkerSlot};

/// Who is fetching, for logs and progress events.
#[derive(Debug, Clone, Copy)]
pub struct FetchJob<'a> {
    pub record_id: &'a str,
    pub slot: WorkerSlot,
    pub progress: &'a ProgressSink,
}

/// What a successful attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Bytes written to the artifact.
    pub bytes: u64,
    /// Pages found by the structural check.
    pub pages: usize,
}

/// One fetch attempt of `url` into `dest`. Blocking; the orchestrator runs it
/// on tokio's blocking pool.
///
/// Implementations must leave `dest` absent whenever they return `Err`.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path, job: &FetchJob<'_>) -> Result<FetchReport, FetchError>;
}
