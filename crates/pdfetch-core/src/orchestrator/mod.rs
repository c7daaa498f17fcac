//! Coordinator loop: pulls record batches, filters them against the ledger,
//! runs the fallback policy on a bounded worker pool, and records every
//! outcome.
//!
//! The orchestrator is the only writer of the ledger and the only reader of
//! the sources. Workers compute outcomes and hand them back through the
//! `JoinSet`.

mod batch;
mod run;

pub use batch::PreparedBatch;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::ledger::Ledger;
use crate::progress::{ProgressSink, WorkerSlot};
use crate::source::RecordSource;

/// Run parameters taken from config and CLI flags.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub output_dir: PathBuf,
    pub ledger_path: PathBuf,
    /// Worker pool size (at least 1).
    pub workers: usize,
    /// Stop once this many records have succeeded in this run.
    pub success_cap: Option<usize>,
}

/// Totals for one `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Records already resolved in the ledger.
    pub skipped: usize,
    /// Records without an id, or repeating an id within their batch.
    pub dropped: usize,
    pub batches: usize,
    pub cap_reached: bool,
}

struct SourceState {
    source: Box<dyn RecordSource>,
    exhausted: bool,
}

pub struct Orchestrator {
    settings: OrchestratorSettings,
    sources: Vec<SourceState>,
    fetcher: Arc<dyn Fetcher>,
    progress: ProgressSink,
    ledger: Ledger,
    free_slots: Vec<WorkerSlot>,
}

impl Orchestrator {
    /// Loads the ledger and prepares the output directory.
    pub fn new(
        settings: OrchestratorSettings,
        sources: Vec<Box<dyn RecordSource>>,
        fetcher: Arc<dyn Fetcher>,
        progress: ProgressSink,
    ) -> Result<Self> {
        std::fs::create_dir_all(&settings.output_dir).with_context(|| {
            format!("create output directory {}", settings.output_dir.display())
        })?;
        let ledger = Ledger::load_or_create(&settings.ledger_path);
        tracing::info!(
            resolved = ledger.len(),
            workers = settings.workers.max(1),
            sources = sources.len(),
            "orchestrator ready"
        );
        let free_slots = Self::slot_pool(settings.workers);
        Ok(Self {
            sources: sources
                .into_iter()
                .map(|source| SourceState {
                    source,
                    exhausted: false,
                })
                .collect(),
            settings,
            fetcher,
            progress,
            ledger,
            free_slots,
        })
    }

    /// Free list in pop order 1, 2, ... W.
    fn slot_pool(workers: usize) -> Vec<WorkerSlot> {
        let mut slots = WorkerSlot::pool(workers);
        slots.reverse();
        slots
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
