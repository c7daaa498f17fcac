//! Progress events for whatever is watching a run (CLI printer, GUI, tests).
//!
//! The orchestrator and its workers hold a `ProgressSink`; sends never block.
//! When the channel is full, closed, or was never attached, events are dropped.

use tokio::sync::mpsc;

/// A fetch worker slot, `1..=W`. Assigned by the orchestrator at dispatch time
/// and handed to the task explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerSlot {
    pub worker_id: usize,
}

impl WorkerSlot {
    /// Slots `1..=workers`.
    pub fn pool(workers: usize) -> Vec<WorkerSlot> {
        (1..=workers.max(1))
            .map(|worker_id| WorkerSlot { worker_id })
            .collect()
    }
}

/// Message sent to the progress consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// What one worker is doing and how far along it is.
    WorkerUpdate {
        worker_id: usize,
        label: String,
        percent: u8,
    },
    /// Aggregate counters for the run so far.
    CountersUpdate { succeeded: usize, failed: usize },
    /// The run is over; the consumer can stop polling.
    Quit,
}

/// Fire-and-forget sender side of the progress channel.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    /// A sink with a bounded channel of `capacity` events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink with no consumer; every event is dropped.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(event);
        }
    }

    pub fn worker(&self, slot: WorkerSlot, label: impl Into<String>, percent: u8) {
        self.emit(ProgressEvent::WorkerUpdate {
            worker_id: slot.worker_id,
            label: label.into(),
            percent: percent.min(100),
        });
    }

    pub fn counters(&self, succeeded: usize, failed: usize) {
        self.emit(ProgressEvent::CountersUpdate { succeeded, failed });
    }

    pub fn quit(&self) {
        self.emit(ProgressEvent::Quit);
    }
}

/// One row of the consumer-side worker table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRow {
    pub worker_id: usize,
    pub label: String,
    pub percent: u8,
}

/// Consumer-side projection of the event stream: one row per worker plus the
/// latest counters. Holds no authoritative state; it only mirrors events.
#[derive(Debug, Clone)]
pub struct ProgressBoard {
    rows: Vec<WorkerRow>,
    pub succeeded: usize,
    pub failed: usize,
    pub finished: bool,
}

impl ProgressBoard {
    pub fn new(workers: usize) -> Self {
        let rows = WorkerSlot::pool(workers)
            .into_iter()
            .map(|slot| WorkerRow {
                worker_id: slot.worker_id,
                label: "Idle".to_string(),
                percent: 0,
            })
            .collect();
        Self {
            rows,
            succeeded: 0,
            failed: 0,
            finished: false,
        }
    }

    pub fn rows(&self) -> &[WorkerRow] {
        &self.rows
    }

    /// Applies one event. Returns false once `Quit` has been seen.
    ///
    /// Updates for a worker id outside the board are ignored; events may
    /// arrive in any order relative to each other.
    pub fn apply(&mut self, event: &ProgressEvent) -> bool {
        match event {
            ProgressEvent::WorkerUpdate {
                worker_id,
                label,
                percent,
            } => {
                if let Some(row) = self.rows.iter_mut().find(|r| r.worker_id == *worker_id) {
                    row.label.clone_from(label);
                    row.percent = (*percent).min(100);
                }
            }
            ProgressEvent::CountersUpdate { succeeded, failed } => {
                self.succeeded = *succeeded;
                self.failed = *failed;
            }
            ProgressEvent::Quit => self.finished = true,
        }
        !self.finished
    }
}
