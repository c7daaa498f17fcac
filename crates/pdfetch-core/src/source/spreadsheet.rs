//! Spreadsheet datasets (`.xlsx`, `.xls`, `.ods`, ...) through calamine.
//!
//! calamine materializes the whole sheet, so rows are extracted once at open
//! and handed out in batches.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::VecDeque;
use std::path::Path;

use super::{ColumnIndex, RawRecord, RecordSource};
use crate::config::ColumnConfig;

pub struct SpreadsheetSource {
    name: String,
    rows: VecDeque<RawRecord>,
    batch_size: usize,
}

impl SpreadsheetSource {
    /// Reads the first worksheet; its first row is the header.
    pub fn open(path: &Path, columns: &ColumnConfig, batch_size: usize) -> Result<Self> {
        let name = path.display().to_string();
        let mut workbook =
            open_workbook_auto(path).with_context(|| format!("open workbook {}", name))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("workbook {} has no worksheets", name))?
            .with_context(|| format!("read first worksheet of {}", name))?;

        let mut iter = range.rows();
        let rows = match iter.next() {
            Some(header) => {
                let header: Vec<String> = header.iter().map(cell_text).collect();
                let index = ColumnIndex::locate(header.iter().map(String::as_str), columns, &name);
                iter.map(|row| index.extract(|i| row.get(i).map(cell_text)))
                    .collect()
            }
            None => VecDeque::new(),
        };
        tracing::debug!(source = %name, rows = rows.len(), "loaded spreadsheet dataset");
        Ok(Self {
            name,
            rows,
            batch_size: batch_size.max(1),
        })
    }
}

impl RecordSource for SpreadsheetSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_batch(&mut self) -> Result<Option<Vec<RawRecord>>> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        let n = self.batch_size.min(self.rows.len());
        Ok(Some(self.rows.drain(..n).collect()))
    }
}

/// Cell as text. Whole-number floats drop the `.0` so numeric ids read as
/// they were typed.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_render_as_integers() {
        assert_eq!(cell_text(&Data::Float(12345.0)), "12345");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String("BR1".into())), "BR1");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn not_a_workbook_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(SpreadsheetSource::open(&path, &ColumnConfig::default(), 10).is_err());
    }
}
