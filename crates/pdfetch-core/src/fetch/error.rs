//! Failure taxonomy for a single fetch attempt.

/// Why an attempt (or a whole record) did not produce a valid artifact.
/// The `Display` text is what lands in the ledger's `info` column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("No valid or malformed primary link")]
    NoValidPrimaryLink,
    #[error("No valid link found")]
    NoValidLink,
    #[error("Insufficient disk space: {0}")]
    InsufficientSpace(String),
    #[error("GET request error: {0}")]
    TransferError(String),
    #[error("No %PDF- signature in the initial data")]
    NotAPdf,
    #[error("Downloaded file is zero bytes")]
    EmptyFile,
    #[error("PDF parse error: {0}")]
    StructuralError(String),
    #[error("File write error: {0}")]
    Storage(String),
    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl FetchError {
    /// Short stable name of the variant, for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "InvalidURL",
            FetchError::NoValidPrimaryLink => "NoValidPrimaryLink",
            FetchError::NoValidLink => "NoValidLink",
            FetchError::InsufficientSpace(_) => "InsufficientSpace",
            FetchError::TransferError(_) => "TransferError",
            FetchError::NotAPdf => "NotAPDF",
            FetchError::EmptyFile => "EmptyFile",
            FetchError::StructuralError(_) => "StructuralError",
            FetchError::Storage(_) => "Storage",
            FetchError::Unhandled(_) => "Unhandled",
        }
    }
}
