//! Types stored in the status ledger.

/// Resolution of a record, stored as a string in the ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Success,
    Failure,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Success => "Success",
            EntryStatus::Failure => "Failure",
        }
    }

    /// Parses the ledger spelling; anything else is not a resolution.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Success" => Some(EntryStatus::Success),
            "Failure" => Some(EntryStatus::Failure),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub id: String,
    pub status: EntryStatus,
    pub info: String,
}

/// Totals used by the `status` command and run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub success: usize,
    pub failure: usize,
}
