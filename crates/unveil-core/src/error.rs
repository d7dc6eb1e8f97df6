//! Error types for the store layer.

use thiserror::Error;

/// Errors that can occur while reading or writing the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid marker attribute value: {0:?}")]
    InvalidMarker(String),

    #[error("Element not found: {0}")]
    ElementNotFound(u64),

    #[error("Sequence not found: {0}")]
    SequenceNotFound(u64),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
