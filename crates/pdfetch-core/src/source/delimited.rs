//! CSV datasets, streamed `batch_size` rows at a time.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

use super::{ColumnIndex, RawRecord, RecordSource};
use crate::config::ColumnConfig;

pub struct CsvSource {
    name: String,
    reader: Option<csv::Reader<File>>,
    columns: ColumnIndex,
    batch_size: usize,
}

impl CsvSource {
    pub fn open(path: &Path, columns: &ColumnConfig, batch_size: usize) -> Result<Self> {
        let name = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("open dataset {}", name))?;
        let headers = reader
            .headers()
            .with_context(|| format!("read header of {}", name))?
            .clone();
        let columns = ColumnIndex::locate(headers.iter(), columns, &name);
        tracing::debug!(source = %name, "opened CSV dataset");
        Ok(Self {
            name,
            reader: Some(reader),
            columns,
            batch_size: batch_size.max(1),
        })
    }
}

impl RecordSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_batch(&mut self) -> Result<Option<Vec<RawRecord>>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut row = csv::StringRecord::new();
        while batch.len() < self.batch_size {
            match reader.read_record(&mut row) {
                Ok(true) => {
                    batch.push(self.columns.extract(|i| row.get(i).map(str::to_string)));
                }
                Ok(false) => {
                    self.reader = None;
                    break;
                }
                Err(e) => {
                    // Unrecoverable I/O ends the dataset; bad rows are skipped.
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        self.reader = None;
                        return Err(e).with_context(|| format!("read {}", self.name));
                    }
                    tracing::warn!(source = %self.name, "skipping unparseable row: {}", e);
                }
            }
        }
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}
