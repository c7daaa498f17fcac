//! Record sources: bounded batches of `{id, primary_link, secondary_link}`
//! rows pulled from tabular datasets.

mod delimited;
mod memory;
mod spreadsheet;

pub use delimited::CsvSource;
pub use memory::MemorySource;
pub use spreadsheet::SpreadsheetSource;

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::ColumnConfig;

/// A row as read from a dataset. The id may be missing; the orchestrator
/// drops such rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub id: Option<String>,
    pub primary_link: Option<String>,
    pub secondary_link: Option<String>,
}

impl RawRecord {
    pub fn new(id: &str, primary: Option<&str>, secondary: Option<&str>) -> Self {
        Self {
            id: clean_cell(id),
            primary_link: primary.and_then(clean_cell),
            secondary_link: secondary.and_then(clean_cell),
        }
    }
}

/// One unit of work: an identifier plus up to two candidate links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub primary_link: Option<String>,
    pub secondary_link: Option<String>,
}

impl TryFrom<RawRecord> for Record {
    type Error = RawRecord;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, RawRecord> {
        match raw.id {
            Some(id) => Ok(Record {
                id,
                primary_link: raw.primary_link,
                secondary_link: raw.secondary_link,
            }),
            None => Err(raw),
        }
    }
}

/// Producer of record batches. `next_batch` returns `Ok(None)` once
/// exhausted; after that it keeps returning `Ok(None)`.
pub trait RecordSource: Send {
    fn name(&self) -> &str;
    fn next_batch(&mut self) -> Result<Option<Vec<RawRecord>>>;
}

/// Opens `path` with the source matching its extension.
pub fn open_dataset(
    path: &Path,
    columns: &ColumnConfig,
    batch_size: usize,
) -> Result<Box<dyn RecordSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(Box::new(CsvSource::open(path, columns, batch_size)?)),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            Ok(Box::new(SpreadsheetSource::open(path, columns, batch_size)?))
        }
        _ => bail!("unsupported dataset format: {}", path.display()),
    }
}

/// Trimmed cell text; blank cells are `None`.
pub(crate) fn clean_cell(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Header positions of the configured columns.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ColumnIndex {
    id: Option<usize>,
    primary: Option<usize>,
    secondary: Option<usize>,
}

impl ColumnIndex {
    pub(crate) fn locate<'h>(
        headers: impl IntoIterator<Item = &'h str>,
        columns: &ColumnConfig,
        source: &str,
    ) -> Self {
        let headers: Vec<&str> = headers.into_iter().map(str::trim).collect();
        let find = |name: &str| {
            let pos = headers.iter().position(|h| *h == name.trim());
            if pos.is_none() {
                tracing::warn!(source, column = name, "column not found in header");
            }
            pos
        };
        Self {
            id: find(&columns.id),
            primary: find(&columns.primary_link),
            secondary: find(&columns.secondary_link),
        }
    }

    /// Builds a record from a row, given a way to read cell `i` as text.
    pub(crate) fn extract<F>(&self, cell: F) -> RawRecord
    where
        F: Fn(usize) -> Option<String>,
    {
        let get = |col: Option<usize>| col.and_then(&cell).as_deref().and_then(clean_cell);
        RawRecord {
            id: get(self.id),
            primary_link: get(self.primary),
            secondary_link: get(self.secondary),
        }
    }
}
