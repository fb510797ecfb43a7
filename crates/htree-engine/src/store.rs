//! Graph State Store
//!
//! Canonical node and edge maps keyed by id, in first-seen order.
//!
//! # Invariants
//! - One node per distinct id; later sightings merge only the mutable fields
//!   and never move the node.
//! - One edge per ordered `(parent, child)` pair, and at most one parent
//!   edge per child (the node set is a forest). Cycles are not checked.
//! - Snapshots are owned copies; nothing hands out `&mut` to the maps.

use crate::error::EngineError;
use crate::tracker::StatusTracker;
use htree_model::id::prefix_parent;
use htree_model::{Edge, EdgeKey, GraphSnapshot, HypothesisNode, NodeRecord, Position, RenderNode};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::time::Instant;

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of the id
    Inserted,
    /// Existing node merged in place
    Updated,
}

/// Owned node/edge state
#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    nodes: IndexMap<String, HypothesisNode>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl GraphStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a first sighting or merge a later one
    ///
    /// New nodes start at [`Position::ORIGIN`] pending layout. A non-root
    /// parent ensures exactly one edge for the pair; a different non-root
    /// parent on a later sighting replaces the child's parent edge.
    pub fn upsert_node(&mut self, record: &NodeRecord) -> UpsertOutcome {
        let outcome = match self.nodes.get_mut(&record.id) {
            Some(existing) => {
                existing.merge(record);
                UpsertOutcome::Updated
            }
            None => {
                self.nodes
                    .insert(record.id.clone(), HypothesisNode::from_record(record));
                UpsertOutcome::Inserted
            }
        };

        if let Some(parent) = record.parent() {
            self.link(parent, &record.id);
        }
        outcome
    }

    /// Ensure the single parent edge of `child` is `parent → child`
    fn link(&mut self, parent: &str, child: &str) {
        let key = EdgeKey::new(parent, child);
        if self.edges.contains_key(&key) {
            return;
        }

        let stale: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|k| k.target == child)
            .cloned()
            .collect();
        for old in stale {
            tracing::debug!(child, from = %old.source, to = parent, "reparenting node");
            self.edges.shift_remove(&old);
        }

        self.edges.insert(key.clone(), Edge::from_key(&key));
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent_id = Some(parent.to_string());
        }
    }

    /// Whether `id` has been promoted into the store
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HypothesisNode> {
        self.nodes.get(id)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in first-seen order
    pub fn nodes(&self) -> impl Iterator<Item = &HypothesisNode> {
        self.nodes.values()
    }

    /// Edges in first-seen order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Whether an edge exists for the pair
    #[inline]
    #[must_use]
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges.contains_key(&EdgeKey::new(source, target))
    }

    /// Write laid-out positions back; ids absent from `positions` keep theirs
    pub fn apply_positions(&mut self, positions: &HashMap<String, Position>) {
        for (id, node) in &mut self.nodes {
            if let Some(pos) = positions.get(id) {
                node.position = *pos;
            }
        }
    }

    /// Replace label and reasoning of an existing node
    ///
    /// # Errors
    /// [`EngineError::NodeNotFound`] when the id was never promoted.
    pub fn edit_node(&mut self, id: &str, text: &str, reasoning: &str) -> Result<(), EngineError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| EngineError::NodeNotFound(id.to_string()))?;
        node.label = text.to_string();
        node.reasoning = reasoning.to_string();
        Ok(())
    }

    /// Parent of a node
    ///
    /// The edge targeting `id` is authoritative. Without one, the id prefix
    /// (`"1.2.3"` → `"1.2"`) is used when that node exists.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        if let Some(edge) = self.edges.values().find(|e| e.target == id) {
            return Some(edge.source.as_str());
        }
        prefix_parent(id).and_then(|p| self.nodes.get_key_value(p).map(|(key, _)| key.as_str()))
    }

    /// All descendants of `id`, nearest first
    ///
    /// Follows edges; nodes that have no parent edge fall back to id-prefix
    /// descent.
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in self.edges.values() {
            children.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        }
        for node in self.nodes.values() {
            if self.edges.values().any(|e| e.target == node.id) {
                continue;
            }
            if let Some(parent) = prefix_parent(&node.id) {
                children.entry(parent).or_default().push(node.id.as_str());
            }
        }

        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut out = Vec::new();
        let mut frontier: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = frontier.pop_front() {
            for child in children.get(current).into_iter().flatten() {
                if seen.insert(child) {
                    out.push((*child).to_string());
                    frontier.push_back(child);
                }
            }
        }
        out
    }

    /// Remove nodes and every edge touching them
    pub fn remove_nodes(&mut self, ids: &[String]) {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.nodes.retain(|id, _| !doomed.contains(id.as_str()));
        self.edges
            .retain(|key, _| !doomed.contains(key.source.as_str()) && !doomed.contains(key.target.as_str()));
    }

    /// Flat records in first-seen order, parent ids via [`Self::parent_of`]
    #[must_use]
    pub fn export_tree(&self) -> Vec<NodeRecord> {
        self.nodes
            .values()
            .map(|node| NodeRecord {
                id: node.id.clone(),
                parent_id: Some(
                    self.parent_of(&node.id)
                        .unwrap_or(htree_model::ROOT_SENTINEL)
                        .to_string(),
                ),
                text: node.label.clone(),
                reasoning: node.reasoning.clone(),
                is_leaf: node.is_leaf,
                tools_used: node.tools_used.clone(),
            })
            .collect()
    }

    /// Nodes merged with their current status
    #[must_use]
    pub fn merge_status_into_nodes(&self, tracker: &StatusTracker, now: Instant) -> Vec<RenderNode> {
        self.nodes
            .values()
            .map(|node| RenderNode {
                node: node.clone(),
                meta: tracker.view(&node.id, now),
            })
            .collect()
    }

    /// Owned snapshot for rendering
    #[must_use]
    pub fn snapshot(&self, tracker: &StatusTracker, revision: u64) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.merge_status_into_nodes(tracker, Instant::now()),
            edges: self.edges.values().cloned().collect(),
            revision,
        }
    }

    /// Drop all nodes and edges
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, parent: &str, text: &str) -> NodeRecord {
        NodeRecord::new(id, parent, text)
    }

    #[test]
    fn root_has_no_edge() {
        let mut store = GraphStore::new();
        assert_eq!(store.upsert_node(&rec("1", "0", "Root")), UpsertOutcome::Inserted);
        assert_eq!(store.len(), 1);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.get("1").unwrap().position, Position::ORIGIN);
    }

    #[test]
    fn repeated_pair_yields_one_edge() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "Root"));
        for _ in 0..3 {
            store.upsert_node(&rec("1.1", "1", "Child"));
        }
        assert_eq!(store.edge_count(), 1);
        assert!(store.has_edge("1", "1.1"));
    }

    #[test]
    fn update_keeps_position() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "Root"));
        store.apply_positions(&HashMap::from([("1".to_string(), Position::new(12.0, 34.0))]));

        assert_eq!(store.upsert_node(&rec("1", "0", "Root v2")), UpsertOutcome::Updated);
        let node = store.get("1").unwrap();
        assert_eq!(node.label, "Root v2");
        assert_eq!(node.position, Position::new(12.0, 34.0));
    }

    #[test]
    fn reparent_replaces_parent_edge() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "a"));
        store.upsert_node(&rec("2", "0", "b"));
        store.upsert_node(&rec("1.1", "1", "c"));
        store.upsert_node(&rec("1.1", "2", "c"));

        assert_eq!(store.edge_count(), 1);
        assert!(store.has_edge("2", "1.1"));
        assert_eq!(store.parent_of("1.1"), Some("2"));
    }

    #[test]
    fn root_sighting_does_not_drop_known_parent() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "a"));
        store.upsert_node(&rec("1.1", "1", "b"));
        store.upsert_node(&rec("1.1", "0", "b"));
        assert!(store.has_edge("1", "1.1"));
    }

    #[test]
    fn parent_lookup_prefers_edges_over_prefix() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "a"));
        store.upsert_node(&rec("2", "0", "b"));
        store.upsert_node(&rec("1.5", "2", "moved"));
        let mut orphan = rec("1.6", "0", "no edge");
        orphan.parent_id = None;
        store.upsert_node(&orphan);

        assert_eq!(store.parent_of("1.5"), Some("2"));
        assert_eq!(store.parent_of("1.6"), Some("1"));
        assert_eq!(store.parent_of("3.1"), None);
    }

    #[test]
    fn prefix_parent_is_borrowed_from_the_store() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("4", "0", "root"));

        let present = {
            let query = String::from("4.2");
            store.parent_of(&query)
        };
        let absent = {
            let query = String::from("5.2");
            store.parent_of(&query)
        };

        assert_eq!(present, Some("4"));
        assert_eq!(absent, None);
    }

    #[test]
    fn descendants_follow_edges_then_prefix() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "root"));
        store.upsert_node(&rec("1.1", "1", "a"));
        store.upsert_node(&rec("1.1.1", "1.1", "b"));
        store.upsert_node(&rec("1.2", "1", "c"));
        let mut loose = rec("1.1.2", "0", "no edge");
        loose.parent_id = None;
        store.upsert_node(&loose);

        let mut under = store.descendants("1.1");
        under.sort();
        assert_eq!(under, vec!["1.1.1".to_string(), "1.1.2".to_string()]);
        assert_eq!(store.descendants("1").len(), 4);
        assert!(store.descendants("1.2").is_empty());
    }

    #[test]
    fn remove_nodes_drops_touching_edges() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "root"));
        store.upsert_node(&rec("1.1", "1", "a"));
        store.upsert_node(&rec("1.1.1", "1.1", "b"));
        store.remove_nodes(&["1.1".to_string(), "1.1.1".to_string()]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn export_uses_edge_parents() {
        let mut store = GraphStore::new();
        store.upsert_node(&rec("1", "0", "root"));
        store.upsert_node(&rec("1.1", "1", "a").with_leaf(true));

        let tree = store.export_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].parent_id.as_deref(), Some("0"));
        assert_eq!(tree[1].parent_id.as_deref(), Some("1"));
        assert!(tree[1].is_leaf);
    }

    #[test]
    fn edit_unknown_node_fails() {
        let mut store = GraphStore::new();
        assert_eq!(
            store.edit_node("9", "x", "y"),
            Err(EngineError::NodeNotFound("9".to_string()))
        );
    }
}
