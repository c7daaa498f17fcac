//! Per-record link fallback: primary first, secondary only when the primary
//! fails, failure reasons merged when both fail.

use std::path::Path;

use crate::fetch::{FetchError, FetchJob, Fetcher};
use crate::ledger::EntryStatus;
use crate::progress::{ProgressSink, WorkerSlot};
use crate::source::Record;
use crate::url_model::{artifact_path, normalize_url};

/// Final resolution of one record, folded into a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub status: EntryStatus,
    pub detail: String,
}

impl DownloadOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: EntryStatus::Success,
            detail: detail.into(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            status: EntryStatus::Failure,
            detail: detail.into(),
        }
    }

    /// Failure for a pipeline that panicked instead of returning.
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::failure(FetchError::Unhandled(message.into()).to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Primary,
    Secondary,
}

impl Link {
    fn as_str(self) -> &'static str {
        match self {
            Link::Primary => "primary",
            Link::Secondary => "secondary",
        }
    }
}

/// A link worth attempting: present and normalizable.
fn usable(link: Option<&str>) -> Option<&str> {
    link.filter(|l| normalize_url(l).is_ok())
}

fn attempt(
    link: Link,
    url: &str,
    dest: &Path,
    fetcher: &dyn Fetcher,
    job: &FetchJob<'_>,
) -> Result<(), FetchError> {
    job.progress.worker(
        job.slot,
        format!("Attempting {} ({})", job.record_id, link.as_str()),
        0,
    );
    match fetcher.fetch(url, dest, job) {
        Ok(report) => {
            tracing::debug!(
                id = job.record_id,
                worker = job.slot.worker_id,
                link = link.as_str(),
                bytes = report.bytes,
                "link succeeded"
            );
            Ok(())
        }
        Err(e) => {
            tracing::debug!(
                id = job.record_id,
                worker = job.slot.worker_id,
                link = link.as_str(),
                kind = e.kind(),
                "link failed: {}",
                e
            );
            Err(e)
        }
    }
}

/// Primary → secondary decision procedure for one record. Never fails; every
/// error becomes a `Failure` outcome.
pub fn resolve_record(
    record: &Record,
    fetcher: &dyn Fetcher,
    output_dir: &Path,
    slot: WorkerSlot,
    progress: &ProgressSink,
) -> DownloadOutcome {
    let dest = artifact_path(output_dir, &record.id);
    let job = FetchJob {
        record_id: &record.id,
        slot,
        progress,
    };

    let primary = usable(record.primary_link.as_deref());
    let primary_err = match primary {
        Some(url) => match attempt(Link::Primary, url, &dest, fetcher, &job) {
            Ok(()) => return finish(&job, DownloadOutcome::success("Primary link OK")),
            Err(e) => e,
        },
        None => {
            tracing::warn!(id = %record.id, "no valid primary URL");
            FetchError::NoValidPrimaryLink
        }
    };

    let outcome = match usable(record.secondary_link.as_deref()) {
        Some(url) => match attempt(Link::Secondary, url, &dest, fetcher, &job) {
            Ok(()) => DownloadOutcome::success(format!(
                "Secondary link OK (primary failed: {})",
                primary_err
            )),
            Err(secondary_err) => DownloadOutcome::failure(format!(
                "Both links failed. Primary=({}); Secondary=({})",
                primary_err,
                secondary_err
            )),
        },
        None if primary.is_none() => DownloadOutcome::failure(FetchError::NoValidLink.to_string()),
        None => DownloadOutcome::failure(primary_err.to_string()),
    };
    finish(&job, outcome)
}

fn finish(job: &FetchJob<'_>, outcome: DownloadOutcome) -> DownloadOutcome {
    let verdict = if outcome.is_success() { "SUCCESS" } else { "FAIL" };
    job.progress
        .worker(job.slot, format!("{} => {}", job.record_id, verdict), 100);
    job.progress.worker(job.slot, "Idle", 0);
    outcome
}
