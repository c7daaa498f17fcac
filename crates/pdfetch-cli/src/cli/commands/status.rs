//! `pdfetch status` – summarize the status ledger.

use anyhow::Result;
use pdfetch_core::ledger::{EntryStatus, Ledger};
use std::path::Path;

pub fn run_status(ledger_path: &Path, failures: bool) -> Result<()> {
    if !ledger_path.exists() {
        println!("No status ledger at {}.", ledger_path.display());
        return Ok(());
    }
    let ledger = Ledger::load_or_create(ledger_path);
    let counts = ledger.counts();
    println!("{}", ledger_path.display());
    println!("{:<10} {}", "Success", counts.success);
    println!("{:<10} {}", "Failure", counts.failure);
    println!("{:<10} {}", "Total", ledger.len());

    if failures && counts.failure > 0 {
        println!();
        println!("{:<16} {}", "ID", "INFO");
        for e in ledger
            .entries()
            .iter()
            .filter(|e| e.status == EntryStatus::Failure)
        {
            println!("{:<16} {}", e.id, e.info);
        }
    }
    Ok(())
}
