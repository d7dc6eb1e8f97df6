//! Diagnostic side channel.
//!
//! Messages are single human-readable lines; nothing parses them.

use parking_lot::Mutex;
use std::sync::Arc;

/// Receives diagnostics from the engine.
///
/// May be called while the engine holds its store lock; implementations must
/// not call back into the engine.
pub trait Logger: Send + Sync + 'static {
    fn log(&self, message: &str);
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::warn!(target: "unveil", "{}", message);
    }
}

/// Keeps every message in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLogger {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        tracing::debug!(target: "unveil", "{}", message);
        self.messages.lock().push(message.to_string());
    }
}
