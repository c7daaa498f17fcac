//! CLI for the pdfetch bulk downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdfetch_core::config;
use std::path::PathBuf;

use commands::{run_download, run_status, run_verify, RunArgs};

/// Top-level CLI for pdfetch.
#[derive(Debug, Parser)]
#[command(name = "pdfetch")]
#[command(about = "pdfetch: bulk PDF downloader with a resumable status ledger", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pdfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every unresolved record from the datasets.
    Run(RunArgs),

    /// Summarize the status ledger.
    Status {
        /// Ledger file (defaults to `ledger_path` from config).
        #[arg(long, value_name = "PATH")]
        ledger: Option<PathBuf>,
        /// Also list every failed id with its reason.
        #[arg(long)]
        failures: bool,
    },

    /// Check that a local file is a structurally valid PDF.
    Verify {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => {
                let mut cfg = cfg;
                args.apply(&mut cfg);
                run_download(&cfg).await?;
            }
            CliCommand::Status { ledger, failures } => {
                let path = ledger.unwrap_or_else(|| cfg.ledger_path.clone());
                run_status(&path, failures)?;
            }
            CliCommand::Verify { path } => run_verify(&path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
