//! Target descriptors handed to the node resolver.

use serde::Serialize;

/// What a `reveal` call points at.
///
/// The engine never interprets a descriptor itself; it is passed verbatim to
/// the resolver and recorded in history so the call can be replayed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target<N> {
    /// A selector resolved against the container.
    Selector(String),
    /// A single, already resolved node.
    Node(N),
    /// An ordered list of already resolved nodes.
    Nodes(Vec<N>),
}

impl<N> Target<N> {
    pub fn selector(selector: impl Into<String>) -> Self {
        Target::Selector(selector.into())
    }

    pub fn as_selector(&self) -> Option<&str> {
        match self {
            Target::Selector(selector) => Some(selector),
            _ => None,
        }
    }
}

impl<N> From<&str> for Target<N> {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl<N> From<String> for Target<N> {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl<N> From<Vec<N>> for Target<N> {
    fn from(nodes: Vec<N>) -> Self {
        Target::Nodes(nodes)
    }
}

impl<N> std::fmt::Display for Target<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Selector(selector) => write!(f, "{}", selector),
            Target::Node(_) => write!(f, "<node>"),
            Target::Nodes(nodes) => write!(f, "<{} nodes>", nodes.len()),
        }
    }
}
