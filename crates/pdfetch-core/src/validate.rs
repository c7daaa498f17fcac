//! Content checks for downloaded artifacts.
//!
//! Two stages: a cheap signature test on the first bytes of a transfer, and a
//! full structural parse of the finished file with `lopdf`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::fetch::FetchError;

/// PDF header magic.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// How many leading bytes may precede the magic (PDF allows junk before the header).
pub const SIGNATURE_WINDOW: usize = 1024;

/// True if `%PDF-` occurs within the first `SIGNATURE_WINDOW` bytes of `head`.
pub fn has_pdf_signature(head: &[u8]) -> bool {
    let window = &head[..head.len().min(SIGNATURE_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Parses the whole document: trailer, catalog, page tree, and every page's
/// content streams. Returns the page count, or the parser's message verbatim.
pub fn check_structure(path: &Path) -> Result<usize, String> {
    let doc = lopdf::Document::load(path).map_err(|e| e.to_string())?;
    doc.catalog().map_err(|e| e.to_string())?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err("document has no pages".to_string());
    }
    for (number, page_id) in &pages {
        doc.get_page_content(*page_id)
            .map_err(|e| format!("page {}: {}", number, e))?;
    }
    Ok(pages.len())
}

/// Runs the signature and structural checks on a file already on disk.
pub fn verify_file(path: &Path) -> Result<usize, FetchError> {
    let mut head = Vec::with_capacity(SIGNATURE_WINDOW);
    File::open(path)
        .and_then(|f| f.take(SIGNATURE_WINDOW as u64).read_to_end(&mut head))
        .map_err(|e| FetchError::Storage(format!("{}: {}", path.display(), e)))?;
    if head.is_empty() {
        return Err(FetchError::EmptyFile);
    }
    if !has_pdf_signature(&head) {
        return Err(FetchError::NotAPdf);
    }
    check_structure(path).map_err(FetchError::StructuralError)
}
