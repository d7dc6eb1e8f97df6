//! Recursive overlay of configuration records.
//!
//! Objects merge key by key; every other value (numbers, strings, arrays,
//! null) replaces whatever the target held. Sources are applied in order, so
//! later sources win on conflicting keys.

use serde_json::{Map, Value};

/// Overlay each source onto `target`, in order, and return `target`.
///
/// `None` sources and sources that are not objects are skipped. If `target`
/// is not an object it is replaced by an empty one before the first overlay.
pub fn deep_merge<'a, I>(target: &mut Value, sources: I) -> &mut Value
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    for source in sources.into_iter().flatten() {
        if let Value::Object(source) = source {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                overlay(map, source);
            }
        }
    }
    target
}

/// Build a fresh object from the given sources.
pub fn merged<'a, I>(sources: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut target = Value::Object(Map::new());
    deep_merge(&mut target, sources);
    match target {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Overlay one object onto another in place.
pub fn overlay(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(child) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(slot) = slot {
                    overlay(slot, child);
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
