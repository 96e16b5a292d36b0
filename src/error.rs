// ⚠️ Directory Errors - domain error kinds for the core and its collaborators

use thiserror::Error;

/// Errors that can occur while resolving, importing or persisting SWIFT codes.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No record matches the requested code or country.
    #[error("{subject} not found: {key}")]
    NotFound { subject: &'static str, key: String },

    /// A record with this code is already stored.
    #[error("SWIFT code {0} already exists")]
    DuplicateCode(String),

    /// The store refused to delete the record.
    #[error("SWIFT code {code} could not be deleted: {reason}")]
    DeletionConflict { code: String, reason: String },

    /// Input that does not follow the 8+3 code layout or the country format.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("record source error: {0}")]
    Source(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DirectoryError {
    pub fn code_not_found(code: &str) -> Self {
        DirectoryError::NotFound {
            subject: "SWIFT code",
            key: code.to_string(),
        }
    }

    pub fn country_not_found(iso2: &str) -> Self {
        DirectoryError::NotFound {
            subject: "SWIFT codes for country",
            key: iso2.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound { .. })
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DirectoryError>;
