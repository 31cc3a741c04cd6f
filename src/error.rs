use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required text field was missing or blank.
    #[error("{field} is required and must be a non-empty string")]
    Validation { field: &'static str },

    #[error("log entry not found: {id}")]
    NotFound { id: String },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file exists but does not hold a valid `{ "logs": [...] }`
    /// document.
    #[error("store file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::Corrupt { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
