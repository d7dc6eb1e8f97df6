//! The element / container / sequence store.
//!
//! A `Store` is the single source of truth for everything an engine has
//! registered. Records are keyed by process-wide ids (see [`crate::id`]) and
//! kept in `BTreeMap`s, so iteration is always in ascending id order, which is
//! also allocation order.
//!
//! The store holds node handles but never owns the nodes themselves; their
//! lifetime belongs to the document.

use crate::error::{CoreError, Result};
use crate::target::Target;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Attribute stamped onto every registered node, holding its element id.
pub const MARKER_ATTRIBUTE: &str = "data-sr-id";

/// Smallest interval magnitude (ms) that forms a sequence: one frame at 60Hz.
pub const MIN_SEQUENCE_INTERVAL_MS: i64 = 16;

/// Position of an element inside a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SequenceMembership {
    pub id: u64,
    pub index: usize,
}

/// One managed visual unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Element<N> {
    pub id: u64,
    pub config: Map<String, Value>,
    pub container_id: u64,
    pub node: N,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SequenceMembership>,
    /// `None` until styles have been generated successfully.
    pub styles: Option<Value>,
}

impl<N> Element<N> {
    /// A fresh shell: empty config, no sequence, no styles.
    pub fn new(id: u64, container_id: u64, node: N) -> Self {
        Self {
            id,
            config: Map::new(),
            container_id,
            node,
            sequence: None,
            styles: None,
        }
    }

    /// Marker value written onto the node.
    pub fn marker(&self) -> String {
        self.id.to_string()
    }
}

/// Scroll/observation root shared by zero or more elements.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Container<N> {
    pub node: N,
}

/// An ordered group of elements revealed one at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub id: u64,
    /// Signed spacing in milliseconds; negative traverses in reverse.
    pub interval: i64,
    pub element_ids: Vec<u64>,
    pub first_active_index: usize,
    pub last_active_index: usize,
}

impl Sequence {
    pub fn new(id: u64, interval: i64) -> Self {
        Self {
            id,
            interval,
            element_ids: Vec::new(),
            first_active_index: 0,
            last_active_index: 0,
        }
    }

    /// Whether `interval` is large enough to sequence at all.
    pub fn qualifies(interval: i64) -> bool {
        interval.unsigned_abs() >= MIN_SEQUENCE_INTERVAL_MS as u64
    }

    pub fn is_reverse(&self) -> bool {
        self.interval < 0
    }

    /// Minimum spacing between successive reveals.
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.interval.unsigned_abs())
    }

    /// Append an element, returning its membership.
    pub fn push(&mut self, element_id: u64) -> SequenceMembership {
        let index = self.element_ids.len();
        self.element_ids.push(element_id);
        SequenceMembership { id: self.id, index }
    }

    /// Remove an element; returns whether it was a member.
    pub fn remove(&mut self, element_id: u64) -> bool {
        let before = self.element_ids.len();
        self.element_ids.retain(|id| *id != element_id);
        before != self.element_ids.len()
    }

    /// Element ids in the order they should reveal.
    pub fn traversal_order(&self) -> Vec<u64> {
        if self.is_reverse() {
            self.element_ids.iter().rev().copied().collect()
        } else {
            self.element_ids.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.element_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.element_ids.is_empty()
    }
}

/// One non-synchronized registration call, kept for replay.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry<N> {
    pub target: Target<N>,
    pub options: Map<String, Value>,
    pub interval: Option<i64>,
}

/// Everything an engine instance has registered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Store<N> {
    pub containers: BTreeMap<u64, Container<N>>,
    pub elements: BTreeMap<u64, Element<N>>,
    pub sequences: BTreeMap<u64, Sequence>,
    pub history: Vec<HistoryEntry<N>>,
}

impl<N> Default for Store<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Store<N> {
    pub fn new() -> Self {
        Self {
            containers: BTreeMap::new(),
            elements: BTreeMap::new(),
            sequences: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Look up the element a marker attribute points at.
    pub fn element_for_marker(&self, marker: &str) -> Result<&Element<N>> {
        let id = parse_marker(marker)?;
        self.elements.get(&id).ok_or(CoreError::ElementNotFound(id))
    }

    pub fn element(&self, id: u64) -> Option<&Element<N>> {
        self.elements.get(&id)
    }

    pub fn sequence(&self, id: u64) -> Option<&Sequence> {
        self.sequences.get(&id)
    }

    pub fn sequence_mut(&mut self, id: u64) -> Result<&mut Sequence> {
        self.sequences
            .get_mut(&id)
            .ok_or(CoreError::SequenceNotFound(id))
    }

    /// Elements belonging to a sequence, in membership order.
    pub fn sequence_elements(&self, id: u64) -> Result<Vec<&Element<N>>> {
        let sequence = self.sequence(id).ok_or(CoreError::SequenceNotFound(id))?;
        Ok(sequence
            .element_ids
            .iter()
            .filter_map(|element_id| self.elements.get(element_id))
            .collect())
    }

    /// Insert or overwrite an element under its id.
    pub fn insert_element(&mut self, element: Element<N>) -> Option<Element<N>> {
        self.elements.insert(element.id, element)
    }

    /// Remove an element and its sequence memberships.
    pub fn remove_element(&mut self, id: u64) -> Option<Element<N>> {
        let element = self.elements.remove(&id)?;
        self.prune_sequences();
        Some(element)
    }

    /// Drop sequence entries whose element is gone or now belongs to a
    /// different sequence, renumber the survivors, and drop empty sequences.
    pub fn prune_sequences(&mut self) {
        let elements = &mut self.elements;
        for sequence in self.sequences.values_mut() {
            sequence.element_ids.retain(|element_id| {
                elements
                    .get(element_id)
                    .and_then(|element| element.sequence)
                    .is_some_and(|membership| membership.id == sequence.id)
            });
            for (index, element_id) in sequence.element_ids.iter().enumerate() {
                if let Some(membership) = elements
                    .get_mut(element_id)
                    .and_then(|element| element.sequence.as_mut())
                {
                    membership.index = index;
                }
            }
            let last = sequence.len().saturating_sub(1);
            sequence.first_active_index = sequence.first_active_index.min(last);
            sequence.last_active_index = sequence.last_active_index.min(last);
        }
        self.sequences.retain(|_, sequence| !sequence.is_empty());
    }

    /// Drop containers no element refers to.
    pub fn prune_containers(&mut self) {
        let elements = &self.elements;
        self.containers.retain(|id, _| {
            elements
                .values()
                .any(|element| element.container_id == *id)
        });
    }

    /// Reconcile sequences and containers with the current elements.
    pub fn rinse(&mut self) {
        self.prune_sequences();
        self.prune_containers();
    }

    pub fn insert_sequence(&mut self, sequence: Sequence) {
        self.sequences.insert(sequence.id, sequence);
    }

    pub fn insert_container(&mut self, id: u64, node: N) {
        self.containers.insert(id, Container { node });
    }

    pub fn record(&mut self, entry: HistoryEntry<N>) {
        self.history.push(entry);
    }

    pub fn elements_in_container(&self, container_id: u64) -> impl Iterator<Item = &Element<N>> {
        self.elements
            .values()
            .filter(move |element| element.container_id == container_id)
    }

    /// True when nothing has been registered and nothing recorded.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
            && self.elements.is_empty()
            && self.sequences.is_empty()
            && self.history.is_empty()
    }
}

impl<N: PartialEq> Store<N> {
    /// Linear scan for a container whose node matches.
    pub fn find_container(&self, node: &N) -> Option<u64> {
        self.containers
            .iter()
            .find(|(_, container)| &container.node == node)
            .map(|(id, _)| *id)
    }
}

impl<N: Serialize> Store<N> {
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Parse a marker attribute value back into an element id.
pub fn parse_marker(marker: &str) -> Result<u64> {
    marker
        .trim()
        .parse::<u64>()
        .map_err(|_| CoreError::InvalidMarker(marker.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequence_threshold() {
        assert!(!Sequence::qualifies(0));
        assert!(!Sequence::qualifies(15));
        assert!(!Sequence::qualifies(-15));
        assert!(Sequence::qualifies(16));
        assert!(Sequence::qualifies(-16));
        assert!(Sequence::qualifies(i64::MIN));
    }

    #[test]
    fn test_sequence_push_and_order() {
        let mut sequence = Sequence::new(7, -200);
        assert_eq!(sequence.push(1), SequenceMembership { id: 7, index: 0 });
        assert_eq!(sequence.push(2), SequenceMembership { id: 7, index: 1 });
        sequence.push(3);

        assert!(sequence.is_reverse());
        assert_eq!(sequence.spacing(), Duration::from_millis(200));
        assert_eq!(sequence.traversal_order(), vec![3, 2, 1]);
        assert_eq!(sequence.first_active_index, 0);
        assert_eq!(sequence.last_active_index, 0);
    }

    #[test]
    fn test_marker_lookup() {
        let mut store: Store<&str> = Store::new();
        store.insert_element(Element::new(42, 1, "node"));

        assert_eq!(store.element_for_marker("42").unwrap().node, "node");
        assert_eq!(
            store.element_for_marker("43"),
            Err(CoreError::ElementNotFound(43))
        );
        assert_eq!(
            store.element_for_marker("abc"),
            Err(CoreError::InvalidMarker("abc".to_string()))
        );
    }

    #[test]
    fn test_find_container_by_node() {
        let mut store: Store<&str> = Store::new();
        store.insert_container(3, "root");
        store.insert_container(9, "sidebar");

        assert_eq!(store.find_container(&"sidebar"), Some(9));
        assert_eq!(store.find_container(&"footer"), None);
    }

    fn member(id: u64, node: &'static str, sequence: &mut Sequence) -> Element<&'static str> {
        let mut element = Element::new(id, 0, node);
        element.sequence = Some(sequence.push(id));
        element
    }

    #[test]
    fn test_remove_element_prunes_sequences() {
        let mut store: Store<&str> = Store::new();
        let mut sequence = Sequence::new(100, 50);
        let a = member(1, "a", &mut sequence);
        let b = member(2, "b", &mut sequence);
        let c = member(3, "c", &mut sequence);
        store.insert_sequence(sequence);
        let mut lonely = Sequence::new(101, 50);
        lonely.push(4);
        store.insert_sequence(lonely);
        store.insert_element(a);
        store.insert_element(b);
        store.insert_element(c);

        assert!(store.remove_element(2).is_some());

        assert_eq!(store.sequence(100).unwrap().element_ids, vec![1, 3]);
        assert_eq!(store.element(3).unwrap().sequence.unwrap().index, 1);
        assert!(store.sequence(101).is_none());
        assert!(store.remove_element(2).is_none());
    }

    #[test]
    fn test_prune_clamps_active_window() {
        let mut store: Store<&str> = Store::new();
        let mut sequence = Sequence::new(300, 80);
        let elements: Vec<_> = (1..=4)
            .map(|id| member(id, "li", &mut sequence))
            .collect();
        sequence.first_active_index = 2;
        sequence.last_active_index = 3;
        store.insert_sequence(sequence);
        for element in elements {
            store.insert_element(element);
        }

        store.remove_element(4);
        store.remove_element(3);

        let sequence = store.sequence(300).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.first_active_index, 1);
        assert_eq!(sequence.last_active_index, 1);
    }

    #[test]
    fn test_rinse_drops_moved_members_and_orphans() {
        let mut store: Store<&str> = Store::new();
        let mut old = Sequence::new(200, 100);
        let mut fresh = Sequence::new(201, 100);
        let mut a = member(1, "a", &mut old);
        a.sequence = Some(fresh.push(1));
        store.insert_sequence(old);
        store.insert_sequence(fresh);
        store.insert_element(a);
        store.insert_container(0, "root");
        store.insert_container(50, "unused");

        store.rinse();

        assert!(store.sequence(200).is_none());
        assert_eq!(store.sequence(201).unwrap().element_ids, vec![1]);
        assert_eq!(store.containers.keys().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_sequence_elements_in_order() {
        let mut store: Store<&str> = Store::new();
        let mut sequence = Sequence::new(5, 100);
        sequence.push(2);
        sequence.push(1);
        store.insert_sequence(sequence);
        store.insert_element(Element::new(1, 0, "first"));
        store.insert_element(Element::new(2, 0, "second"));

        let nodes: Vec<_> = store
            .sequence_elements(5)
            .unwrap()
            .iter()
            .map(|element| element.node)
            .collect();
        assert_eq!(nodes, vec!["second", "first"]);
        assert!(store.sequence_elements(6).is_err());
    }

    #[test]
    fn test_store_serializes() {
        let mut store: Store<&str> = Store::new();
        let mut element = Element::new(1, 2, "node");
        element.config.insert("duration".into(), json!(600));
        store.insert_element(element);
        store.insert_container(2, "root");
        store.record(HistoryEntry {
            target: Target::selector(".card"),
            options: Map::new(),
            interval: Some(100),
        });

        let value = store.to_json().unwrap();
        assert_eq!(value["elements"]["1"]["config"]["duration"], json!(600));
        assert_eq!(value["containers"]["2"]["node"], json!("root"));
        assert_eq!(value["history"][0]["target"], json!({ "selector": ".card" }));
        assert!(value["elements"]["1"].get("sequence").is_none());
    }
}
