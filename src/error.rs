//! Error types for remote range reads.

use thiserror::Error;

/// Errors that can occur while resolving or reading a remote object.
#[derive(Error, Debug)]
pub enum Error {
    /// The cache capacity must be greater than zero.
    #[error("Invalid cache capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// The object store session could not be established or reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The object (or its container) does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A range of the object could not be fetched.
    #[error("Failed to fetch {object}: {reason}")]
    Fetch { object: String, reason: String },

    /// A full-buffer read ended before the buffer was filled.
    ///
    /// `filled` is best-effort: the bytes already written to the destination
    /// buffer are not guaranteed to be usable.
    #[error("Short read from {object} at offset {offset}: expected {expected} bytes, got {filled}")]
    ShortRead {
        object: String,
        offset: u64,
        expected: usize,
        filled: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn fetch(object: impl Into<String>, reason: impl ToString) -> Self {
        Error::Fetch {
            object: object.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
