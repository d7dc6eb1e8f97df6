//! Error types for the reveal engine.
//!
//! None of these escape `reveal`; they are rendered through the
//! [`Logger`](crate::logger::Logger) and the call degrades to partial progress.

use thiserror::Error;
use unveil_core::CoreError;

/// Error type for engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RevealError {
    #[error("Reveal cannot be performed on 0 elements.")]
    EmptySelection,

    #[error("Clean cannot be performed on 0 elements.")]
    EmptyCleanSelection,

    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    #[error("Stale marker on node: {0}")]
    StaleMarker(#[from] CoreError),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RevealError {
    fn from(err: serde_json::Error) -> Self {
        RevealError::Config(err.to_string())
    }
}

/// Failure reported by a style generator for a single element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Style generation failed for element {element_id}: {reason}")]
pub struct StyleError {
    pub element_id: u64,
    pub reason: String,
}

impl StyleError {
    pub fn new(element_id: u64, reason: impl Into<String>) -> Self {
        Self {
            element_id,
            reason: reason.into(),
        }
    }
}

/// Errors raised while setting up a scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("No tokio runtime is available on this thread")]
    NoRuntime,

    #[error("Deferred initialization needs a current-thread tokio runtime")]
    MultiThreadRuntime,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RevealError>;
