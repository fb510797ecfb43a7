//! Boundary records exchanged with the agent backend
//!
//! These mirror the JSON shapes of `POST /run_agent`: the request body, each
//! streamed message, and the flat node records inside `hypothesis_tree`.
//! Every field the backend may omit carries a serde default so that a
//! partially-populated message still decodes.

use crate::id::is_root_parent;
use serde::{Deserialize, Serialize};

/// One node of the hypothesis tree as the backend streams it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Dotted hierarchical id, unique key
    pub id: String,
    /// Parent id, `"0"` or absent for a root
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Hypothesis or action statement
    #[serde(default)]
    pub text: String,
    /// Optional rationale
    #[serde(default)]
    pub reasoning: String,
    /// Whether this is a terminal, validated branch
    #[serde(default)]
    pub is_leaf: bool,
    /// Ordered tool tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

impl NodeRecord {
    /// Create a record with empty reasoning
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: Some(parent_id.into()),
            text: text.into(),
            reasoning: String::new(),
            is_leaf: false,
            tools_used: Vec::new(),
        }
    }

    /// With reasoning
    #[inline]
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// With leaf flag
    #[inline]
    #[must_use]
    pub fn with_leaf(mut self, is_leaf: bool) -> Self {
        self.is_leaf = is_leaf;
        self
    }

    /// With tool tags
    #[inline]
    #[must_use]
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools_used = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Effective parent, `None` for roots
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        let parent = self.parent_id.as_deref();
        if is_root_parent(parent) {
            None
        } else {
            parent
        }
    }
}

/// Explicit "work started" signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Step name, e.g. `classify_hypothesis`
    pub node: String,
    /// Node id the step works on
    pub item_id: String,
    /// Only `"working"` is meaningful
    #[serde(default)]
    pub status: String,
}

impl Activity {
    /// Whether the signal reports ongoing work
    #[inline]
    #[must_use]
    pub fn is_working(&self) -> bool {
        self.status.eq_ignore_ascii_case("working")
    }
}

/// One decoded message of the agent stream
///
/// Any combination of fields may be present; an empty message is valid and
/// changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMessage {
    /// Append-only explainability log; only the newest entry is actionable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explainability_log: Vec<String>,
    /// Tree delta
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hypothesis_tree: Vec<NodeRecord>,
    /// Closes out the phase of this item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_item_id: Option<String>,
    /// Explicit work-started signal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

impl StreamMessage {
    /// The newest log entry, the only one that drives status
    #[inline]
    #[must_use]
    pub fn latest_log(&self) -> Option<&str> {
        self.explainability_log.last().map(String::as_str)
    }

    /// Whether the message carries nothing actionable
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explainability_log.is_empty()
            && self.hypothesis_tree.is_empty()
            && self.last_completed_item_id.is_none()
            && self.activity.is_none()
    }
}

/// Body of `POST /run_agent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The client problem to analyze
    pub problem_statement: String,
    /// Scratchpad the run belongs to
    #[serde(default)]
    pub scratchpad_id: Option<String>,
    /// Current tree, sent when restarting from an edited node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_tree: Option<Vec<NodeRecord>>,
    /// Node the backend should resume from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_node_id: Option<String>,
}

impl AgentRequest {
    /// Fresh generation request
    #[inline]
    #[must_use]
    pub fn new(problem_statement: impl Into<String>) -> Self {
        Self {
            problem_statement: problem_statement.into(),
            scratchpad_id: None,
            existing_tree: None,
            restart_node_id: None,
        }
    }

    /// With scratchpad id
    #[inline]
    #[must_use]
    pub fn with_scratchpad(mut self, scratchpad_id: impl Into<String>) -> Self {
        self.scratchpad_id = Some(scratchpad_id.into());
        self
    }

    /// Turn into a restart request
    #[inline]
    #[must_use]
    pub fn with_restart(mut self, existing_tree: Vec<NodeRecord>, node_id: impl Into<String>) -> Self {
        self.existing_tree = Some(existing_tree);
        self.restart_node_id = Some(node_id.into());
        self
    }

    /// Whether this resumes an existing tree
    #[inline]
    #[must_use]
    pub fn is_restart(&self) -> bool {
        self.restart_node_id.is_some()
    }
}
