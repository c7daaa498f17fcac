//! `pdfetch run` – download unresolved records from the configured datasets.

use anyhow::{bail, Context, Result};
use clap::Args;
use pdfetch_core::config::PdfetchConfig;
use pdfetch_core::fetch::CurlFetcher;
use pdfetch_core::orchestrator::{Orchestrator, OrchestratorSettings};
use pdfetch_core::progress::{ProgressBoard, ProgressEvent, ProgressSink};
use pdfetch_core::source::open_dataset;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Flags for `pdfetch run`; each one overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Dataset to read records from (CSV or spreadsheet). Repeatable.
    #[arg(long = "dataset", value_name = "PATH")]
    pub datasets: Vec<PathBuf>,
    /// Directory receiving the downloaded PDFs.
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,
    /// Status ledger file.
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
    /// Concurrent downloads.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
    /// Rows read from each dataset per pass.
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,
    /// Stop after N successful downloads.
    #[arg(long, value_name = "N")]
    pub max_success: Option<usize>,
}

impl RunArgs {
    pub fn apply(self, cfg: &mut PdfetchConfig) {
        if !self.datasets.is_empty() {
            cfg.datasets = self.datasets;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if let Some(ledger) = self.ledger {
            cfg.ledger_path = ledger;
        }
        if let Some(n) = self.workers {
            cfg.workers = n.max(1);
        }
        if let Some(n) = self.batch_size {
            cfg.batch_size = n.max(1);
        }
        if self.max_success.is_some() {
            cfg.success_cap = self.max_success;
        }
    }
}

fn render(board: &ProgressBoard) -> String {
    let workers: Vec<String> = board
        .rows()
        .iter()
        .map(|r| format!("w{}: {} {}%", r.worker_id, r.label, r.percent))
        .collect();
    format!(
        "[ok {} | fail {}] {}",
        board.succeeded,
        board.failed,
        workers.join(" | ")
    )
}

/// Prints the board at most every `PROGRESS_INTERVAL`, and once at the end.
async fn print_progress(mut rx: mpsc::Receiver<ProgressEvent>, workers: usize) {
    let mut board = ProgressBoard::new(workers);
    let mut last_print = Instant::now();
    let mut dirty = false;
    while let Some(event) = rx.recv().await {
        let running = board.apply(&event);
        dirty = true;
        if !running {
            break;
        }
        let now = Instant::now();
        if now.duration_since(last_print) >= PROGRESS_INTERVAL {
            println!("{}", render(&board));
            last_print = now;
            dirty = false;
        }
    }
    if dirty {
        println!("{}", render(&board));
    }
}

pub async fn run_download(cfg: &PdfetchConfig) -> Result<()> {
    if cfg.datasets.is_empty() {
        bail!("no datasets given; pass --dataset PATH or set `datasets` in config.toml");
    }
    let mut sources = Vec::with_capacity(cfg.datasets.len());
    for path in &cfg.datasets {
        let source = open_dataset(path, &cfg.columns, cfg.batch_size)
            .with_context(|| format!("open dataset {}", path.display()))?;
        sources.push(source);
    }

    let (progress, progress_rx) = ProgressSink::channel(cfg.progress_capacity);
    let printer = tokio::spawn(print_progress(progress_rx, cfg.workers));

    let settings = OrchestratorSettings {
        output_dir: cfg.output_dir.clone(),
        ledger_path: cfg.ledger_path.clone(),
        workers: cfg.workers,
        success_cap: cfg.success_cap,
    };
    let fetcher = Arc::new(CurlFetcher::new(cfg.fetch.clone()));
    let mut orchestrator = Orchestrator::new(settings, sources, fetcher, progress)?;
    let result = orchestrator.run().await;
    // Dropping the sink closes the channel even if `Quit` was dropped.
    drop(orchestrator);
    let _ = printer.await;
    let summary = result?;

    println!(
        "Done: {} succeeded, {} failed, {} already resolved, {} dropped.",
        summary.succeeded, summary.failed, summary.skipped, summary.dropped
    );
    if summary.cap_reached {
        println!("Stopped early: success cap reached.");
    }
    Ok(())
}
