//! Turning a raw pull into the records worth dispatching.

use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

use crate::ledger::Ledger;
use crate::source::{RawRecord, Record};
use crate::url_model::artifact_file_name;

/// Records left to dispatch plus what was filtered out.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub records: VecDeque<Record>,
    pub skipped: usize,
    pub dropped: usize,
}

impl PreparedBatch {
    /// Shuffles, then drops rows without an id, rows whose artifact name is
    /// already taken in this batch (repeated ids included), and ids the ledger
    /// already resolved.
    pub fn prepare(mut raw: Vec<RawRecord>, ledger: &Ledger) -> Self {
        let mut batch = PreparedBatch::default();
        if raw.is_empty() {
            return batch;
        }
        if raw.iter().all(|r| r.id.is_none()) {
            tracing::warn!(rows = raw.len(), "batch has no record ids; dropping it");
            batch.dropped = raw.len();
            return batch;
        }

        raw.shuffle(&mut rand::thread_rng());
        let mut seen = HashSet::new();
        for raw in raw {
            let record = match Record::try_from(raw) {
                Ok(record) => record,
                Err(raw) => {
                    tracing::debug!(link = ?raw.primary_link, "dropping record without id");
                    batch.dropped += 1;
                    continue;
                }
            };
            if !seen.insert(artifact_file_name(&record.id)) {
                tracing::debug!(id = %record.id, "dropping record whose artifact name repeats in batch");
                batch.dropped += 1;
                continue;
            }
            if ledger.is_resolved(&record.id) {
                batch.skipped += 1;
                continue;
            }
            batch.records.push_back(record);
        }
        if batch.dropped > 0 {
            tracing::warn!(dropped = batch.dropped, "dropped records without a usable id");
        }
        batch
    }
}
