//! Error types for jotter.

use thiserror::Error;

/// Result type alias using jotter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for jotter operations.
///
/// The taxonomy is deliberately small. Operations fail validation before any
/// store call, fail authorization through filter scoping, or pass a
/// collaborator's failure through with its message intact.
#[derive(Error, Debug)]
pub enum Error {
    /// No identity bound to the operation.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A lookup scoped by id and owner matched nothing. Conflates "missing"
    /// and "not owned" so a non-owner cannot probe for existence.
    #[error("Not found or access denied")]
    NotFoundOrForbidden,

    /// Validation: a note needs content or at least one attachment.
    #[error("Note has no content and no attachments")]
    EmptyNote,

    /// Record Store or Blob Store operation failed; carries the
    /// collaborator's message verbatim.
    #[error("Storage error: {0}")]
    Store(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Store(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Store(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Store(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Store(e.to_string())
    }
}
