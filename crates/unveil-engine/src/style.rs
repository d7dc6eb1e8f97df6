//! Style generation hook.

use crate::error::StyleError;
use crate::node::Node;
use serde_json::{Map, Value};
use unveil_core::Element;

/// Computes the presentation description of a fully merged element.
///
/// Called on every registration of the element, after its configuration has
/// been merged. Must be a pure function of the element.
///
/// Runs while the engine holds its store write lock; implementations must not
/// call back into the engine (not even [`Reveal::store`](crate::Reveal::store)).
///
/// ```rust
/// use serde_json::{json, Value};
/// use std::sync::Arc;
/// use unveil_engine::{Element, ManualScheduler, MemoryDocument, MemoryNode, Reveal, StyleError};
///
/// let doc = MemoryDocument::new();
/// doc.root().append(MemoryNode::new("p"));
/// let engine = Reveal::builder(doc, Arc::new(ManualScheduler::new()))
///     .styles(|element: &Element<MemoryNode>| -> Result<Value, StyleError> {
///         Ok(json!({ "opacity": element.config["opacity"] }))
///     })
///     .build()
///     .unwrap();
///
/// engine.reveal("p", (), None);
/// let store = engine.store();
/// let element = store.elements.values().next().unwrap();
/// assert_eq!(element.styles, Some(json!({ "opacity": 0.0 })));
/// ```
pub trait StyleGenerator<N: Node>: Send + Sync + 'static {
    fn generate(&self, element: &Element<N>) -> Result<Value, StyleError>;
}

impl<N, F> StyleGenerator<N> for F
where
    N: Node,
    F: Fn(&Element<N>) -> Result<Value, StyleError> + Send + Sync + 'static,
{
    fn generate(&self, element: &Element<N>) -> Result<Value, StyleError> {
        self(element)
    }
}

/// Generator that produces an empty description for every element.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStyles;

impl<N: Node> StyleGenerator<N> for NoStyles {
    fn generate(&self, _element: &Element<N>) -> Result<Value, StyleError> {
        Ok(Value::Object(Map::new()))
    }
}
