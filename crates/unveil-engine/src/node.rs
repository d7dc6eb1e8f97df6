//! Node handles and node resolution.
//!
//! The engine never touches a real document. It sees nodes through the
//! [`Node`] trait (identity plus attribute access) and finds them through a
//! [`NodeResolver`]. [`MemoryDocument`] is an in-memory implementation used
//! for testing, simulation and the demo binary.

use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use unveil_core::Target;

/// A non-owning handle to a document node.
///
/// Equality must be node identity, not structural equality: two handles are
/// equal exactly when they refer to the same node.
pub trait Node: Clone + PartialEq + Send + Sync + 'static {
    /// Read an attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Write an attribute, replacing any previous value.
    fn set_attribute(&self, name: &str, value: &str);

    /// Remove an attribute if present.
    fn remove_attribute(&self, name: &str);
}

/// Turns descriptors into concrete nodes.
pub trait NodeResolver<N: Node>: Send + Sync + 'static {
    /// Resolve a container descriptor. `None` if nothing matches.
    fn container(&self, descriptor: &str) -> Option<N>;

    /// Resolve a target within `container`, in document order.
    fn targets(&self, target: &Target<N>, container: &N) -> Vec<N>;
}

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

struct NodeData {
    key: u64,
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attributes: RwLock<BTreeMap<String, String>>,
    children: RwLock<Vec<MemoryNode>>,
}

/// An in-memory document node. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct MemoryNode {
    data: Arc<NodeData>,
}

impl MemoryNode {
    /// Create a detached node.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            data: Arc::new(NodeData {
                key: NEXT_NODE.fetch_add(1, Ordering::Relaxed),
                tag: tag.into().to_ascii_lowercase(),
                dom_id: None,
                classes: Vec::new(),
                attributes: RwLock::new(BTreeMap::new()),
                children: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Set the `id`. Only valid before the node is shared.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.rebuild(|data| data.dom_id = Some(id.into()))
    }

    /// Add a class. Only valid before the node is shared.
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.rebuild(|data| data.classes.push(class.into()))
    }

    fn rebuild(self, apply: impl FnOnce(&mut NodeData)) -> Self {
        let mut data = match Arc::try_unwrap(self.data) {
            Ok(data) => data,
            Err(shared) => NodeData {
                key: shared.key,
                tag: shared.tag.clone(),
                dom_id: shared.dom_id.clone(),
                classes: shared.classes.clone(),
                attributes: RwLock::new(shared.attributes.read().clone()),
                children: RwLock::new(shared.children.read().clone()),
            },
        };
        apply(&mut data);
        Self {
            data: Arc::new(data),
        }
    }

    /// Append a child and return it.
    pub fn append(&self, child: MemoryNode) -> MemoryNode {
        self.data.children.write().push(child.clone());
        child
    }

    /// Detach a direct child. Returns whether it was found.
    pub fn remove_child(&self, child: &MemoryNode) -> bool {
        let mut children = self.data.children.write();
        let before = children.len();
        children.retain(|existing| existing != child);
        before != children.len()
    }

    pub fn tag(&self) -> &str {
        &self.data.tag
    }

    pub fn dom_id(&self) -> Option<&str> {
        self.data.dom_id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.data.classes
    }

    pub fn children(&self) -> Vec<MemoryNode> {
        self.data.children.read().clone()
    }

    /// All descendants in document (pre-)order, excluding `self`.
    pub fn descendants(&self) -> Vec<MemoryNode> {
        let mut out = Vec::new();
        let mut stack: Vec<MemoryNode> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Short descriptor such as `div#hero.card.wide`.
    pub fn descriptor(&self) -> String {
        let mut out = self.data.tag.clone();
        if let Some(id) = &self.data.dom_id {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.data.classes {
            out.push('.');
            out.push_str(class);
        }
        out
    }
}

impl PartialEq for MemoryNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data.key == other.data.key
    }
}

impl Eq for MemoryNode {}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.descriptor())
    }
}

impl Serialize for MemoryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.descriptor())
    }
}

impl Node for MemoryNode {
    fn attribute(&self, name: &str) -> Option<String> {
        self.data.attributes.read().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.data
            .attributes
            .write()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&self, name: &str) {
        self.data.attributes.write().remove(name);
    }
}

/// A compound selector: `tag`, `#id`, `.class`, `*`, or a combination such
/// as `div.card.wide`. Combinators are not supported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SimpleSelector {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }

        let mut selector = SimpleSelector::default();
        let mut rest = input;

        let head_len = rest.find(['#', '.']).unwrap_or(rest.len());
        let head = &rest[..head_len];
        if !head.is_empty() && head != "*" {
            if !head.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            selector.tag = Some(head.to_ascii_lowercase());
        }
        rest = &rest[head_len..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let len = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..len];
            if name.is_empty() {
                return None;
            }
            match marker {
                '#' => selector.id = Some(name.to_string()),
                '.' => selector.classes.push(name.to_string()),
                _ => return None,
            }
            rest = &body[len..];
        }

        Some(selector)
    }

    fn matches(&self, node: &MemoryNode) -> bool {
        self.tag.as_deref().map_or(true, |tag| tag == node.tag())
            && self.id.as_deref().map_or(true, |id| Some(id) == node.dom_id())
            && self
                .classes
                .iter()
                .all(|class| node.classes().iter().any(|c| c == class))
    }
}

/// Parse a comma separated selector list; `None` if any part is invalid.
fn parse_selector_list(input: &str) -> Option<Vec<SimpleSelector>> {
    input.split(',').map(SimpleSelector::parse).collect()
}

/// An in-memory document rooted at an `<html>` node.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    root: MemoryNode,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            root: MemoryNode::new("html"),
        }
    }

    pub fn root(&self) -> &MemoryNode {
        &self.root
    }

    /// Every node matching `selector` under (and including) `scope`.
    pub fn query(&self, selector: &str, scope: &MemoryNode) -> Vec<MemoryNode> {
        let Some(selectors) = parse_selector_list(selector) else {
            tracing::trace!(selector, "memory document: invalid selector");
            return Vec::new();
        };
        std::iter::once(scope.clone())
            .chain(scope.descendants())
            .filter(|node| selectors.iter().any(|s| s.matches(node)))
            .collect()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeResolver<MemoryNode> for MemoryDocument {
    fn container(&self, descriptor: &str) -> Option<MemoryNode> {
        self.query(descriptor, &self.root).into_iter().next()
    }

    fn targets(&self, target: &Target<MemoryNode>, container: &MemoryNode) -> Vec<MemoryNode> {
        match target {
            Target::Selector(selector) => self
                .query(selector, container)
                .into_iter()
                .filter(|node| node != container)
                .collect(),
            Target::Node(node) => vec![node.clone()],
            Target::Nodes(nodes) => nodes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryDocument, MemoryNode, MemoryNode, MemoryNode) {
        let doc = MemoryDocument::new();
        let body = doc.root().append(MemoryNode::new("body"));
        let hero = body.append(MemoryNode::new("section").with_id("hero"));
        let a = hero.append(MemoryNode::new("div").with_class("card"));
        let b = hero.append(MemoryNode::new("div").with_class("card").with_class("wide"));
        (doc, a, b, hero)
    }

    #[test]
    fn test_query_in_document_order() {
        let (doc, a, b, _) = sample();
        assert_eq!(doc.query(".card", doc.root()), vec![a.clone(), b.clone()]);
        assert_eq!(doc.query("div.wide", doc.root()), vec![b]);
        assert_eq!(doc.query("div", doc.root()).len(), 2);
    }

    #[test]
    fn test_selector_lists_and_universal() {
        let (doc, a, b, hero) = sample();
        assert_eq!(doc.query("#hero, .wide", doc.root()), vec![hero, b]);
        assert_eq!(doc.query("*", doc.root()).len(), 5);
        assert!(doc.query("div .card", doc.root()).is_empty());
        assert!(doc.query("", doc.root()).is_empty());
        assert!(doc.query("..card", doc.root()).is_empty());
        assert_eq!(doc.query(".card", &a), vec![a]);
    }

    #[test]
    fn test_resolver_scopes_to_container() {
        let (doc, a, b, hero) = sample();
        let container = doc.container("#hero").unwrap();
        assert_eq!(container, hero);

        let nodes = doc.targets(&Target::selector("*"), &container);
        assert_eq!(nodes, vec![a.clone(), b]);
        assert_eq!(doc.targets(&Target::Node(a.clone()), &container), vec![a]);
        assert!(doc.container("#missing").is_none());
        assert_eq!(doc.container("html").as_ref(), Some(doc.root()));
    }

    #[test]
    fn test_attributes_shared_between_handles() {
        let node = MemoryNode::new("p");
        let other = node.clone();
        node.set_attribute("data-sr-id", "12");

        assert_eq!(other.attribute("data-sr-id").as_deref(), Some("12"));
        other.remove_attribute("data-sr-id");
        assert!(node.attribute("data-sr-id").is_none());
    }

    #[test]
    fn test_identity_not_structure() {
        let a = MemoryNode::new("div").with_class("card");
        let b = MemoryNode::new("div").with_class("card");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(format!("{:?}", a), "<div.card>");
    }
}
