//! Durable id → outcome ledger.
//!
//! Stored as a three-column CSV (`id,status,info`). Loading never fails: a
//! missing file, or one without the required header, yields an empty ledger
//! (an unusable file is first renamed to `<name>.unusable`). Rows that cannot
//! be decoded are skipped one by one. Saving writes a sibling temp file and
//! renames it over the old one, so readers never see a truncated ledger.

pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Header columns, in order.
pub const COLUMNS: [&str; 3] = ["id", "status", "info"];

/// Suffix given to a ledger file that could not be loaded.
pub const UNUSABLE_SUFFIX: &str = ".unusable";

/// In-memory ledger. Owned by the orchestrator (single writer).
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<StatusEntry>,
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the ledger at `path`, or returns an empty one if the file is
    /// absent or does not have the required columns. An unusable file is moved
    /// aside so the next `persist` cannot overwrite it.
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("status ledger not found, starting empty: {}", path.display());
            return Self::new();
        }
        match Self::read(path) {
            Ok(ledger) => {
                tracing::debug!(entries = ledger.len(), "loaded status ledger {}", path.display());
                ledger
            }
            Err(e) => {
                tracing::warn!("status ledger {} unusable, starting empty: {:#}", path.display(), e);
                let mut aside = path.as_os_str().to_owned();
                aside.push(UNUSABLE_SUFFIX);
                match std::fs::rename(path, &aside) {
                    Ok(()) => tracing::warn!("moved unusable ledger to {}", Path::new(&aside).display()),
                    Err(e) => tracing::warn!("could not move unusable ledger aside: {}", e),
                }
                Self::new()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("open {}", path.display()))?;
        let headers = reader.headers().context("read ledger header")?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let (Some(id_col), Some(status_col), Some(info_col)) =
            (position(COLUMNS[0]), position(COLUMNS[1]), position(COLUMNS[2]))
        else {
            anyhow::bail!("missing required columns (have {:?})", headers);
        };

        let mut ledger = Self::new();
        let mut record = csv::ByteRecord::new();
        let mut row = 0usize;
        loop {
            row += 1;
            match reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    tracing::warn!(row, "stopped reading status ledger: {}", e);
                    break;
                }
                Err(e) => {
                    tracing::warn!(row, "skipping unreadable ledger row: {}", e);
                    continue;
                }
            }
            let field = |col: usize| record.get(col).unwrap_or_default();
            let Ok(id) = std::str::from_utf8(field(id_col)).map(str::trim) else {
                tracing::warn!(row, "skipping ledger row with undecodable id");
                continue;
            };
            if id.is_empty() {
                continue;
            }
            let raw_status = String::from_utf8_lossy(field(status_col));
            let Some(status) = EntryStatus::parse(&raw_status) else {
                tracing::warn!(id, status = %raw_status, "skipping ledger row with unknown status");
                continue;
            };
            // Free text; a bad byte here must not cost the entry.
            let info = String::from_utf8_lossy(field(info_col));
            ledger.record(id, status, info.into_owned());
        }
        Ok(ledger)
    }

    /// True iff `id` has a Success or Failure entry.
    pub fn is_resolved(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&StatusEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Upserts the entry for `id`; an existing entry is overwritten in place.
    pub fn record(&mut self, id: &str, status: EntryStatus, info: impl Into<String>) {
        let info = info.into();
        match self.index.get(id) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.status = status;
                entry.info = info;
            }
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push(StatusEntry {
                    id: id.to_string(),
                    status,
                    info,
                });
            }
        }
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> LedgerCounts {
        self.entries
            .iter()
            .fold(LedgerCounts::default(), |mut acc, e| {
                match e.status {
                    EntryStatus::Success => acc.success += 1,
                    EntryStatus::Failure => acc.failure += 1,
                }
                acc
            })
    }

    /// Writes the whole ledger to `path` via temp file + rename.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create ledger directory {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp ledger in {}", dir.display()))?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(COLUMNS)?;
            for e in &self.entries {
                writer.write_record([e.id.as_str(), e.status.as_str(), e.info.as_str()])?;
            }
            writer.flush().context("flush ledger")?;
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all().context("sync ledger")?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("replace ledger {}", path.display()))?;
        tracing::debug!(entries = self.entries.len(), "saved status ledger {}", path.display());
        Ok(())
    }
}
