//! Process-wide unique identifiers.
//!
//! Elements, containers and sequences all draw from the same counter, so an
//! id is unique across every store in the process, not just within one.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns the next identifier. Strictly increasing, never 0, never reused.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
