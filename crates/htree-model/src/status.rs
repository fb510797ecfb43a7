//! Work-status vocabulary
//!
//! A [`Step`] is one backend operation (formulate, break down, research,
//! classify, identify); each step belongs to a [`Phase`], the unit that
//! per-node timings are accumulated under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of backend processing attributable to one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Web search and hypothesis formulation
    Research,
    /// Classifying a hypothesis
    Classify,
    /// Identifying the analysis a leaf needs
    Identify,
    /// Breaking a hypothesis into children
    Breakdown,
}

impl Phase {
    /// All phases in display order
    pub const ALL: [Phase; 4] = [Phase::Research, Phase::Classify, Phase::Identify, Phase::Breakdown];

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Research => "research",
            Phase::Classify => "classify",
            Phase::Identify => "identify",
            Phase::Breakdown => "breakdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend operation recognized in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// `formulate_top_hypothesis`
    Formulate,
    /// `breakdown_hypothesis`
    Breakdown,
    /// Free-text "Researching"
    Research,
    /// `classify_hypothesis`
    Classify,
    /// `identify_analysis`
    Identify,
}

impl Step {
    /// Resolve a backend step name
    ///
    /// Accepts the graph node names the agent reports (`classify_hypothesis`)
    /// as well as the short forms (`classify`). Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "formulate_top_hypothesis" | "formulate" => Some(Step::Formulate),
            "breakdown_hypothesis" | "breakdown" => Some(Step::Breakdown),
            "research" | "researching" => Some(Step::Research),
            "classify_hypothesis" | "classify" => Some(Step::Classify),
            "identify_analysis" | "identify" => Some(Step::Identify),
            _ => None,
        }
    }

    /// Phase this step's time is accounted under
    #[inline]
    #[must_use]
    pub fn phase(self) -> Phase {
        match self {
            Step::Formulate | Step::Research => Phase::Research,
            Step::Breakdown => Phase::Breakdown,
            Step::Classify => Phase::Classify,
            Step::Identify => Phase::Identify,
        }
    }

    /// Display label while the step is running
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Step::Formulate => "STRATEGY",
            Step::Breakdown => "BREAKDOWN",
            Step::Research => "SEARCHING",
            Step::Classify => "CLASSIFYING",
            Step::Identify => "PLANNING",
        }
    }
}

/// Whether a node currently has backend work in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// No open phase
    #[default]
    Idle,
    /// A phase is open on this node
    Working,
}
