//! # unveil-core
//!
//! Registration state for the Unveil scroll-reveal engine.
//!
//! This crate provides:
//! - Process-wide monotonic identifiers
//! - Deep merge of JSON-like configuration records
//! - The element / container / sequence store and its replay history
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use unveil_core::{deep_merge, next_id};
//!
//! let a = next_id();
//! let b = next_id();
//! assert!(b > a);
//!
//! let mut config = json!({ "duration": 600, "rotate": { "x": 0, "y": 0 } });
//! deep_merge(&mut config, [Some(&json!({ "rotate": { "y": 45 } }))]);
//! assert_eq!(config["rotate"], json!({ "x": 0, "y": 45 }));
//! ```

pub mod error;
pub mod id;
pub mod merge;
pub mod store;
pub mod target;

pub use error::{CoreError, Result};
pub use id::next_id;
pub use merge::{deep_merge, merged};
pub use store::{
    Container, Element, HistoryEntry, Sequence, SequenceMembership, Store, MARKER_ATTRIBUTE,
    MIN_SEQUENCE_INTERVAL_MS,
};
pub use target::Target;
