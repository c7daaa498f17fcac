//! `pdfetch verify` – run the download validation on a local file.

use anyhow::{anyhow, Result};
use pdfetch_core::validate;
use std::path::Path;

pub fn run_verify(path: &Path) -> Result<()> {
    let pages = validate::verify_file(path).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    println!("{}: OK ({} pages)", path.display(), pages);
    Ok(())
}
