//! Canonical graph entities
//!
//! [`HypothesisNode`] is the store's owned copy of a streamed record plus its
//! layout position. [`Edge`]s are derived from `parent_id`, never streamed on
//! their own.

use crate::record::NodeRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-left anchor of a laid-out node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Origin, the position of a node awaiting layout
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    /// Create position
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node of the hypothesis tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisNode {
    /// Dotted id, unique key
    pub id: String,
    /// Hypothesis or action statement
    pub label: String,
    /// Optional rationale
    pub reasoning: String,
    /// Parent id as last reported, `None` for roots
    pub parent_id: Option<String>,
    /// Terminal, validated branch
    pub is_leaf: bool,
    /// Ordered tool tags
    pub tools_used: Vec<String>,
    /// Layout position
    pub position: Position,
}

impl HypothesisNode {
    /// Build a node from its first sighting, positioned at the origin
    #[must_use]
    pub fn from_record(record: &NodeRecord) -> Self {
        Self {
            id: record.id.clone(),
            label: record.text.clone(),
            reasoning: record.reasoning.clone(),
            parent_id: record.parent().map(str::to_string),
            is_leaf: record.is_leaf,
            tools_used: record.tools_used.clone(),
            position: Position::ORIGIN,
        }
    }

    /// Merge the mutable fields of a later sighting
    ///
    /// Position and parent are left untouched.
    pub fn merge(&mut self, record: &NodeRecord) {
        self.label.clone_from(&record.text);
        self.reasoning.clone_from(&record.reasoning);
        self.is_leaf = record.is_leaf;
        self.tools_used.clone_from(&record.tools_used);
    }

    /// Reasoning cut to `max_chars` characters with a trailing ellipsis
    #[must_use]
    pub fn reasoning_preview(&self, max_chars: usize) -> String {
        let mut chars = self.reasoning.char_indices();
        match chars.nth(max_chars) {
            Some((cut, _)) => format!("{}…", &self.reasoning[..cut]),
            None => self.reasoning.clone(),
        }
    }
}

/// Identity of an edge: the ordered `(parent, child)` pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Parent id
    pub source: String,
    /// Child id
    pub target: String,
}

impl EdgeKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}-{}", self.source, self.target)
    }
}

/// Directed parent → child edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Rendered key, `e{source}-{target}`
    pub id: String,
    /// Parent id
    pub source: String,
    /// Child id
    pub target: String,
}

impl Edge {
    /// Create edge for a key
    #[must_use]
    pub fn from_key(key: &EdgeKey) -> Self {
        Self {
            id: key.to_string(),
            source: key.source.clone(),
            target: key.target.clone(),
        }
    }

    /// Key of this edge
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source.clone(), self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_position_and_parent() {
        let first = NodeRecord::new("1.1", "1", "first");
        let mut node = HypothesisNode::from_record(&first);
        node.position = Position::new(40.0, 120.0);

        let mut second = NodeRecord::new("1.1", "9", "second").with_leaf(true);
        second.reasoning = "because".into();
        node.merge(&second);

        assert_eq!(node.label, "second");
        assert_eq!(node.reasoning, "because");
        assert!(node.is_leaf);
        assert_eq!(node.parent_id.as_deref(), Some("1"));
        assert_eq!(node.position, Position::new(40.0, 120.0));
    }

    #[test]
    fn reasoning_preview_respects_char_boundaries() {
        let mut node = HypothesisNode::from_record(&NodeRecord::new("1", "0", "root"));
        node.reasoning = "ééééé".into();
        assert_eq!(node.reasoning_preview(3), "ééé…");
        assert_eq!(node.reasoning_preview(5), "ééééé");
        assert_eq!(node.reasoning_preview(10), "ééééé");
    }

    #[test]
    fn edge_key_renders_like_frontend_ids() {
        let key = EdgeKey::new("1", "1.1");
        assert_eq!(key.to_string(), "e1-1.1");
        assert_eq!(Edge::from_key(&key).key(), key);
    }
}
