//! Render snapshots
//!
//! A [`GraphSnapshot`] is an owned, laid-out copy of the graph merged with
//! per-node status, safe to hand to any drawing surface or serialize.

use crate::node::{Edge, HypothesisNode, Position};
use crate::status::{NodeStatus, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable view of a node's work status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    /// Idle or working
    pub status: NodeStatus,
    /// Currently open phase
    pub phase: Option<Phase>,
    /// Display label of the open phase
    pub phase_label: Option<String>,
    /// Milliseconds the open phase has been running
    pub phase_elapsed_ms: Option<u64>,
    /// Accumulated milliseconds per closed phase
    pub durations_ms: BTreeMap<Phase, u64>,
    /// Time from work start to first appearance
    pub created_ms: Option<u64>,
}

impl StatusView {
    /// Whether the node is the active work item
    #[inline]
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.status == NodeStatus::Working
    }
}

/// Node plus status, ready to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    /// Canonical node data
    #[serde(flatten)]
    pub node: HypothesisNode,
    /// Work status
    pub meta: StatusView,
}

impl RenderNode {
    /// Node id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Laid-out position
    #[inline]
    #[must_use]
    pub fn position(&self) -> Position {
        self.node.position
    }
}

/// Laid-out graph at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in first-seen order
    pub nodes: Vec<RenderNode>,
    /// Edges in first-seen order
    pub edges: Vec<Edge>,
    /// Monotonic render counter
    pub revision: u64,
}

impl GraphSnapshot {
    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Node currently marked working, if any
    #[must_use]
    pub fn working_node(&self) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.meta.is_working())
    }

    /// Whether nothing has arrived yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
