//! Layout Engine
//!
//! Assigns top-left positions to every node of the current graph. The
//! placement itself sits behind [`LayoutAlgorithm`]; the engine turns the
//! algorithm's node centers into top-left anchors and degrades any node the
//! algorithm could not place to a center at the origin.
//!
//! Layout is recomputed from scratch on every call; there is no positional
//! diffing between runs.

mod layered;

pub use layered::LayeredLayout;

use htree_model::{Edge, HypothesisNode, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Direction in which ranks advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDir {
    /// Parents above children
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    /// Parents left of children
    #[serde(rename = "LR")]
    LeftRight,
}

/// Node box and spacing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Box width
    pub node_width: f64,
    /// Box height
    pub node_height: f64,
    /// Gap between consecutive ranks
    pub rank_sep: f64,
    /// Gap between neighbours within a rank
    pub node_sep: f64,
    /// Rank direction
    pub rank_dir: RankDir,
}

impl LayoutConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With box size
    #[inline]
    #[must_use]
    pub fn with_node_size(mut self, width: f64, height: f64) -> Self {
        self.node_width = width;
        self.node_height = height;
        self
    }

    /// With rank and node separation
    #[inline]
    #[must_use]
    pub fn with_separation(mut self, rank_sep: f64, node_sep: f64) -> Self {
        self.rank_sep = rank_sep;
        self.node_sep = node_sep;
        self
    }

    /// With rank direction
    #[inline]
    #[must_use]
    pub fn with_rank_dir(mut self, rank_dir: RankDir) -> Self {
        self.rank_dir = rank_dir;
        self
    }

    /// Box extent along the rank axis
    #[must_use]
    pub(crate) fn rank_extent(&self) -> f64 {
        match self.rank_dir {
            RankDir::TopBottom => self.node_height,
            RankDir::LeftRight => self.node_width,
        }
    }

    /// Box extent across ranks
    #[must_use]
    pub(crate) fn order_extent(&self) -> f64 {
        match self.rank_dir {
            RankDir::TopBottom => self.node_width,
            RankDir::LeftRight => self.node_height,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 320.0,
            node_height: 180.0,
            rank_sep: 100.0,
            node_sep: 80.0,
            rank_dir: RankDir::TopBottom,
        }
    }
}

/// Node center reported by an algorithm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    /// Horizontal center
    pub x: f64,
    /// Vertical center
    pub y: f64,
}

/// Graph handed to an algorithm: node indices into `ids` plus index edges
#[derive(Debug, Clone, Default)]
pub struct LayoutInput<'a> {
    /// Node ids in first-seen order
    pub ids: Vec<&'a str>,
    /// Resolved `(parent, child)` index pairs
    pub edges: Vec<(usize, usize)>,
}

impl<'a> LayoutInput<'a> {
    /// Resolve nodes and edges; edges naming an unknown id are dropped
    #[must_use]
    pub fn build<'n, 'e>(
        nodes: impl IntoIterator<Item = &'n HypothesisNode>,
        edges: impl IntoIterator<Item = &'e Edge>,
    ) -> Self
    where
        'n: 'a,
        'e: 'a,
    {
        let ids: Vec<&'a str> = nodes.into_iter().map(|n| n.id.as_str()).collect();
        let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let edges = edges
            .into_iter()
            .filter_map(|e| match (index.get(e.source.as_str()), index.get(e.target.as_str())) {
                (Some(&s), Some(&t)) if s != t => Some((s, t)),
                _ => {
                    tracing::trace!(edge = %e.id, "edge not resolvable for layout");
                    None
                }
            })
            .collect();
        Self { ids, edges }
    }
}

/// A placement strategy
pub trait LayoutAlgorithm: fmt::Debug + Send + Sync {
    /// Center of every node it can place, indexed like `input.ids`
    fn centers(&self, input: &LayoutInput<'_>, config: &LayoutConfig) -> Vec<Option<Center>>;
}

/// Layout facade over a [`LayoutAlgorithm`]
#[derive(Debug)]
pub struct LayoutEngine {
    config: LayoutConfig,
    algorithm: Box<dyn LayoutAlgorithm>,
}

impl LayoutEngine {
    /// Layered layout with `config`
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_algorithm(config, Box::new(LayeredLayout))
    }

    /// Custom algorithm
    #[must_use]
    pub fn with_algorithm(config: LayoutConfig, algorithm: Box<dyn LayoutAlgorithm>) -> Self {
        Self { config, algorithm }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Top-left position for every node
    ///
    /// A node the algorithm leaves unplaced is anchored as if its center
    /// were the origin.
    #[must_use]
    pub fn layout<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a HypothesisNode>,
        edges: impl IntoIterator<Item = &'a Edge>,
    ) -> HashMap<String, Position> {
        let input = LayoutInput::build(nodes, edges);
        let centers = self.algorithm.centers(&input, &self.config);
        let half_w = self.config.node_width / 2.0;
        let half_h = self.config.node_height / 2.0;

        input
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let center = centers.get(i).copied().flatten().unwrap_or_else(|| {
                    tracing::debug!(node = id, "layout could not place node");
                    Center { x: 0.0, y: 0.0 }
                });
                ((*id).to_string(), Position::new(center.x - half_w, center.y - half_h))
            })
            .collect()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
