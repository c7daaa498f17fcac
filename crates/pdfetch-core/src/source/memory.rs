//! In-memory source for library callers and tests.

use anyhow::Result;
use std::collections::VecDeque;

use super::{RawRecord, RecordSource};

pub struct MemorySource {
    name: String,
    records: VecDeque<RawRecord>,
    batch_size: usize,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, records: Vec<RawRecord>, batch_size: usize) -> Self {
        Self {
            name: name.into(),
            records: records.into(),
            batch_size: batch_size.max(1),
        }
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_batch(&mut self) -> Result<Option<Vec<RawRecord>>> {
        if self.records.is_empty() {
            return Ok(None);
        }
        let n = self.batch_size.min(self.records.len());
        Ok(Some(self.records.drain(..n).collect()))
    }
}
