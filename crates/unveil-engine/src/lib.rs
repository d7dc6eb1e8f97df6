//! Unveil engine - registration, sequencing and scheduling for scroll reveals
//!
//! Page authors mark nodes for reveal treatment; the engine keeps one element
//! record per node, merges configuration across repeated registrations, groups
//! nodes into timed sequences, and hands the settled store to an initializer
//! once per burst of calls.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use unveil_engine::{ManualScheduler, MemoryDocument, MemoryNode, Reveal};
//!
//! let doc = MemoryDocument::new();
//! let list = doc.root().append(MemoryNode::new("ul"));
//! for _ in 0..3 {
//!     list.append(MemoryNode::new("li"));
//! }
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let reveal = Reveal::builder(doc, scheduler.clone())
//!     .initializer(|engine: &Reveal<MemoryNode>| {
//!         println!("{} elements ready", engine.store().elements.len());
//!     })
//!     .build()
//!     .unwrap();
//!
//! // Reveal list items one after another, 150ms apart.
//! reveal.reveal("li", json!({ "origin": "left" }), Some(150));
//!
//! // Host event loop turn: the initializer runs once.
//! scheduler.run_pending();
//! ```
//!
//! # Architecture
//!
//! - [`engine`] - The `Reveal` handle: `reveal`, `sync`, `clean`, `destroy`
//! - [`config`] - Default presentation options and engine configuration
//! - [`node`] - Node handles, resolvers, and an in-memory document
//! - [`scheduler`] - Cancellable deferred tasks (manual and tokio)
//! - [`trigger`] - Debounced initialization trigger
//! - [`style`], [`initializer`], [`logger`] - Collaborator hooks
//! - [`error`] - Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod initializer;
pub mod logger;
pub mod node;
pub mod scheduler;
pub mod style;
pub mod trigger;

// Re-exports for convenience
pub use config::{EngineConfig, EngineConfigBuilder, Origin, RevealDefaults, Rotation, UseDelay, ViewOffset};
pub use engine::{Reveal, RevealArgs, RevealBuilder};
pub use error::{Result, RevealError, SchedulerError, StyleError};
pub use initializer::{Initializer, NoopInitializer};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use node::{MemoryDocument, MemoryNode, Node, NodeResolver};
pub use scheduler::{ManualScheduler, Scheduler, Task, TaskId, TokioScheduler};
pub use style::{NoStyles, StyleGenerator};
pub use trigger::InitTrigger;

// Re-export the store model from unveil-core
pub use unveil_core::{
    Container, Element, HistoryEntry, Sequence, SequenceMembership, Store, Target,
    MARKER_ATTRIBUTE,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{EngineConfig, EngineConfigBuilder};
    pub use crate::engine::Reveal;
    pub use crate::node::{MemoryDocument, MemoryNode, Node, NodeResolver};
    pub use crate::scheduler::{ManualScheduler, Scheduler, TokioScheduler};
    pub use unveil_core::{Element, Store, Target};
}
