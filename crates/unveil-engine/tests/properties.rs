//! Property-based tests for registration.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use unveil_engine::{ManualScheduler, MemoryDocument, MemoryNode, Reveal};

fn engine_with(count: usize) -> Reveal<MemoryNode> {
    let doc = MemoryDocument::new();
    for _ in 0..count {
        doc.root().append(MemoryNode::new("li"));
    }
    Reveal::builder(doc, Arc::new(ManualScheduler::new()))
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn sequence_exists_iff_interval_clears_threshold(interval in -1000i64..1000, count in 1usize..6) {
        let engine = engine_with(count);
        engine.reveal("li", (), Some(interval));

        let store = engine.store();
        let expected = interval.unsigned_abs() >= 16;
        prop_assert_eq!(store.sequences.len(), usize::from(expected));
        prop_assert!(store.elements.values().all(|e| e.sequence.is_some() == expected));
    }

    #[test]
    fn repeated_registration_keeps_one_element_per_node(
        repeats in 1usize..6,
        count in 1usize..6,
        delays in prop::collection::vec(0u64..1000, 1..6),
    ) {
        let engine = engine_with(count);
        for n in 0..repeats {
            let delay = delays[n % delays.len()];
            engine.reveal("li", json!({ "delay": delay }), None);
        }

        let store = engine.store();
        prop_assert_eq!(store.elements.len(), count);
        prop_assert_eq!(store.containers.len(), 1);
        prop_assert_eq!(store.history.len(), repeats);
        let last = delays[(repeats - 1) % delays.len()];
        for element in store.elements.values() {
            prop_assert_eq!(&element.config["delay"], &Value::from(last));
        }
    }
}
