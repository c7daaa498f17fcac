//! The pass loop and the bounded worker pool.

use anyhow::Result;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::batch::PreparedBatch;
use super::{Orchestrator, RunSummary, SourceState};
use crate::fallback::{resolve_record, DownloadOutcome};
use crate::ledger::EntryStatus;
use crate::progress::WorkerSlot;
use crate::source::{RawRecord, Record};

/// What a worker task hands back to the coordinator.
struct Completion {
    id: String,
    slot: WorkerSlot,
    outcome: DownloadOutcome,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

fn read_sources(sources: &mut [SourceState]) -> Option<Vec<RawRecord>> {
    let mut combined = Vec::new();
    let mut any_live = false;
    for state in sources.iter_mut().filter(|s| !s.exhausted) {
        match state.source.next_batch() {
            Ok(Some(batch)) => {
                any_live = true;
                combined.extend(batch);
            }
            Ok(None) => {
                tracing::debug!(source = state.source.name(), "source exhausted");
                state.exhausted = true;
            }
            Err(e) => {
                tracing::warn!(
                    source = state.source.name(),
                    "source failed, treating as exhausted: {:#}",
                    e
                );
                state.exhausted = true;
            }
        }
    }
    any_live.then_some(combined)
}

impl Orchestrator {
    /// Runs passes until every source is exhausted or the success cap is hit.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        loop {
            if self.cap_reached(&summary) {
                tracing::info!(succeeded = summary.succeeded, "success cap reached; stopping");
                summary.cap_reached = true;
                break;
            }
            let Some(raw) = self.pull_batch().await else {
                break;
            };
            summary.batches += 1;

            let batch = PreparedBatch::prepare(raw, &self.ledger);
            summary.skipped += batch.skipped;
            summary.dropped += batch.dropped;
            tracing::info!(
                batch = summary.batches,
                pending = batch.records.len(),
                skipped = batch.skipped,
                "starting batch"
            );
            if batch.records.is_empty() {
                continue;
            }
            self.run_batch(batch.records, &mut summary).await;
            self.persist_ledger();
        }

        self.persist_ledger();
        self.progress.quit();
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            dropped = summary.dropped,
            "run finished"
        );
        Ok(summary)
    }

    fn cap_reached(&self, summary: &RunSummary) -> bool {
        self.settings
            .success_cap
            .is_some_and(|cap| summary.succeeded >= cap)
    }

    /// Tasks allowed in flight: the pool size, further limited so that the
    /// cap cannot be overshot by tasks already running.
    fn dispatch_limit(&self, summary: &RunSummary) -> usize {
        let workers = self.settings.workers.max(1);
        match self.settings.success_cap {
            Some(cap) => workers.min(cap.saturating_sub(summary.succeeded)),
            None => workers,
        }
    }

    /// One batch from every live source, concatenated. `None` once all
    /// sources are exhausted and nothing was pulled. Source reads do blocking
    /// I/O, so the sources move onto the blocking pool for the read.
    async fn pull_batch(&mut self) -> Option<Vec<RawRecord>> {
        let mut sources = std::mem::take(&mut self.sources);
        let read = tokio::task::spawn_blocking(move || {
            let pulled = read_sources(&mut sources);
            (sources, pulled)
        });
        match read.await {
            Ok((sources, pulled)) => {
                self.sources = sources;
                pulled
            }
            Err(e) => {
                let message = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                tracing::error!("source read task died, ending run: {}", message);
                None
            }
        }
    }

    fn spawn(&self, join_set: &mut JoinSet<Completion>, record: Record, slot: WorkerSlot) {
        let fetcher = Arc::clone(&self.fetcher);
        let output_dir = self.settings.output_dir.clone();
        let progress = self.progress.clone();
        join_set.spawn(async move {
            let id = record.id.clone();
            let worker = tokio::task::spawn_blocking({
                let progress = progress.clone();
                move || resolve_record(&record, fetcher.as_ref(), &output_dir, slot, &progress)
            });
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    tracing::error!(id = %id, worker = slot.worker_id, "fetch task died: {}", message);
                    progress.worker(slot, format!("{} => FAIL", id), 100);
                    progress.worker(slot, "Idle", 0);
                    DownloadOutcome::unhandled(message)
                }
            };
            Completion { id, slot, outcome }
        });
    }

    async fn run_batch(&mut self, mut pending: VecDeque<Record>, summary: &mut RunSummary) {
        let mut join_set = JoinSet::new();
        loop {
            while join_set.len() < self.dispatch_limit(summary) {
                let Some(record) = pending.pop_front() else {
                    break;
                };
                let Some(slot) = self.free_slots.pop() else {
                    pending.push_front(record);
                    break;
                };
                tracing::debug!(id = %record.id, worker = slot.worker_id, "dispatching");
                self.spawn(&mut join_set, record, slot);
            }

            if self.cap_reached(summary) && !pending.is_empty() {
                tracing::info!(
                    not_started = pending.len(),
                    "success cap reached; dropping the rest of the batch"
                );
                pending.clear();
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            match joined {
                Ok(done) => {
                    self.free_slots.push(done.slot);
                    self.apply(&done.id, done.outcome, summary);
                }
                Err(e) => tracing::error!("worker task join: {}", e),
            }
        }
        if !pending.is_empty() {
            tracing::warn!(not_started = pending.len(), "no worker slots left for the rest of the batch");
        }
        // Every task has been joined; refill any slot lost to a join error.
        self.free_slots = Self::slot_pool(self.settings.workers);
    }

    fn apply(&mut self, id: &str, outcome: DownloadOutcome, summary: &mut RunSummary) {
        match outcome.status {
            EntryStatus::Success => {
                summary.succeeded += 1;
                tracing::info!(id, detail = %outcome.detail, "record succeeded");
            }
            EntryStatus::Failure => {
                summary.failed += 1;
                tracing::warn!(id, detail = %outcome.detail, "record failed");
            }
        }
        self.ledger.record(id, outcome.status, outcome.detail);
        self.progress.counters(summary.succeeded, summary.failed);
        self.persist_ledger();
    }

    /// A failed save is logged; the next save rewrites the whole ledger.
    fn persist_ledger(&self) {
        if let Err(e) = self.ledger.persist(&self.settings.ledger_path) {
            tracing::warn!("failed to save status ledger: {:#}", e);
        }
    }
}
