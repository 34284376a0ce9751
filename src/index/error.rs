//! Search index error types.

use thiserror::Error;

/// Errors from index maintenance and persistence.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O error reading or writing the index file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted index file could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
