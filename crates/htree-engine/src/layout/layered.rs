//! Layered placement
//!
//! 1. Rank: longest path from the roots over a topological order.
//! 2. Order: alternating barycenter sweeps within each rank.
//! 3. Place: children start under their parents, then parents are centered
//!    over their children; neighbours are pushed apart to keep the gap.
//!
//! A cyclic parent graph has no topological order. It is ranked in arrival
//! order instead; the result is well-defined but not meaningful.

#![allow(clippy::cast_precision_loss)]

use super::{Center, LayoutAlgorithm, LayoutConfig, LayoutInput, RankDir};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

const ORDERING_SWEEPS: usize = 4;

type IndexGraph = DiGraphMap<usize, ()>;

/// Top-to-bottom (or left-to-right) layered layout
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout;

impl LayoutAlgorithm for LayeredLayout {
    fn centers(&self, input: &LayoutInput<'_>, config: &LayoutConfig) -> Vec<Option<Center>> {
        let n = input.ids.len();
        let mut graph = IndexGraph::with_capacity(n, input.edges.len());
        for i in 0..n {
            graph.add_node(i);
        }
        for &(source, target) in &input.edges {
            graph.add_edge(source, target, ());
        }

        let ranks = assign_ranks(&graph, n);
        let mut layers = build_layers(&ranks);
        order_layers(&graph, &ranks, &mut layers);
        let across = place_across(&graph, &layers, config, n);

        let step = config.rank_extent() + config.rank_sep;
        (0..n)
            .map(|i| {
                let along = f64::from(ranks[i]) * step + config.rank_extent() / 2.0;
                Some(match config.rank_dir {
                    RankDir::TopBottom => Center { x: across[i], y: along },
                    RankDir::LeftRight => Center { x: along, y: across[i] },
                })
            })
            .collect()
    }
}

fn assign_ranks(graph: &IndexGraph, n: usize) -> Vec<u32> {
    let order = toposort(graph, None).unwrap_or_else(|cycle| {
        tracing::debug!(node = cycle.node_id(), "cyclic parent graph, ranking in arrival order");
        (0..n).collect()
    });

    let mut ranks = vec![0_u32; n];
    let mut ranked = vec![false; n];
    for v in order {
        ranks[v] = graph
            .neighbors_directed(v, Direction::Incoming)
            .filter(|u| ranked[*u])
            .map(|u| ranks[u] + 1)
            .max()
            .unwrap_or(0);
        ranked[v] = true;
    }
    ranks
}

fn build_layers(ranks: &[u32]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().max().map_or(0, |r| *r as usize + 1);
    let mut layers = vec![Vec::new(); depth];
    for (v, rank) in ranks.iter().enumerate() {
        layers[*rank as usize].push(v);
    }
    layers
}

/// Reorder each rank by the mean slot of its neighbours in the adjacent rank
fn order_layers(graph: &IndexGraph, ranks: &[u32], layers: &mut [Vec<usize>]) {
    let mut slot = vec![0_usize; ranks.len()];
    for layer in layers.iter() {
        for (i, v) in layer.iter().enumerate() {
            slot[*v] = i;
        }
    }

    for sweep in 0..ORDERING_SWEEPS {
        let downward = sweep % 2 == 0;
        let (direction, visit): (Direction, Vec<usize>) = if downward {
            (Direction::Incoming, (1..layers.len()).collect())
        } else {
            (Direction::Outgoing, (0..layers.len().saturating_sub(1)).rev().collect())
        };

        for r in visit {
            let adjacent = if downward { r - 1 } else { r + 1 };
            let mut keyed: Vec<(f64, usize)> = layers[r]
                .iter()
                .map(|&v| {
                    let slots: Vec<usize> = graph
                        .neighbors_directed(v, direction)
                        .filter(|u| ranks[*u] as usize == adjacent)
                        .map(|u| slot[u])
                        .collect();
                    let key = if slots.is_empty() {
                        slot[v] as f64
                    } else {
                        slots.iter().sum::<usize>() as f64 / slots.len() as f64
                    };
                    (key, v)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

            layers[r] = keyed.into_iter().map(|(_, v)| v).collect();
            for (i, v) in layers[r].iter().enumerate() {
                slot[*v] = i;
            }
        }
    }
}

/// Center coordinate of every node across the rank axis
fn place_across(graph: &IndexGraph, layers: &[Vec<usize>], config: &LayoutConfig, n: usize) -> Vec<f64> {
    let spacing = config.order_extent() + config.node_sep;
    let mut across = vec![0.0; n];

    for (r, layer) in layers.iter().enumerate() {
        let desired: Vec<f64> = layer
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let parents: Vec<f64> = if r == 0 {
                    Vec::new()
                } else {
                    graph.neighbors_directed(v, Direction::Incoming).map(|u| across[u]).collect()
                };
                mean(&parents).unwrap_or(i as f64 * spacing)
            })
            .collect();
        pack(layer, &desired, spacing, &mut across);
    }

    for layer in layers.iter().rev().skip(1) {
        let desired: Vec<f64> = layer
            .iter()
            .map(|&v| {
                let children: Vec<f64> = graph
                    .neighbors_directed(v, Direction::Outgoing)
                    .map(|u| across[u])
                    .collect();
                mean(&children).unwrap_or(across[v])
            })
            .collect();
        pack(layer, &desired, spacing, &mut across);
    }

    let min = across.iter().copied().fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        let shift = config.order_extent() / 2.0 - min;
        for value in &mut across {
            *value += shift;
        }
    }
    across
}

/// Place a rank left to right at the desired spots, keeping `spacing` apart
fn pack(layer: &[usize], desired: &[f64], spacing: f64, across: &mut [f64]) {
    let mut previous: Option<f64> = None;
    for (&v, &want) in layer.iter().zip(desired) {
        let placed = previous.map_or(want, |p| want.max(p + spacing));
        across[v] = placed;
        previous = Some(placed);
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use htree_model::{Edge, EdgeKey, HypothesisNode, NodeRecord, Position};
    use std::collections::HashMap;

    fn graph(pairs: &[(&str, &str)]) -> (Vec<HypothesisNode>, Vec<Edge>) {
        let nodes = pairs
            .iter()
            .map(|(id, parent)| HypothesisNode::from_record(&NodeRecord::new(*id, *parent, *id)))
            .collect();
        let edges = pairs
            .iter()
            .filter(|(_, parent)| *parent != "0")
            .map(|(id, parent)| Edge::from_key(&EdgeKey::new(*parent, *id)))
            .collect();
        (nodes, edges)
    }

    fn layout(pairs: &[(&str, &str)], config: LayoutConfig) -> HashMap<String, Position> {
        let (nodes, edges) = graph(pairs);
        LayoutEngine::new(config).layout(&nodes, &edges)
    }

    #[test]
    fn single_node_sits_at_origin() {
        let positions = layout(&[("1", "0")], LayoutConfig::default());
        assert_eq!(positions["1"], Position::new(0.0, 0.0));
    }

    #[test]
    fn parent_is_centered_over_children() {
        let positions = layout(&[("1", "0"), ("1.1", "1"), ("1.2", "1")], LayoutConfig::default());

        assert_eq!(positions["1"], Position::new(200.0, 0.0));
        assert_eq!(positions["1.1"], Position::new(0.0, 280.0));
        assert_eq!(positions["1.2"], Position::new(400.0, 280.0));
    }

    #[test]
    fn chain_advances_one_rank_per_level() {
        let positions = layout(&[("1", "0"), ("1.1", "1"), ("1.1.1", "1.1")], LayoutConfig::default());
        assert_eq!(positions["1.1.1"].y, 560.0);
        assert_eq!(positions["1"].x, positions["1.1.1"].x);
    }

    #[test]
    fn left_right_swaps_axes() {
        let config = LayoutConfig::default().with_rank_dir(RankDir::LeftRight);
        let positions = layout(&[("1", "0"), ("1.1", "1")], config);
        assert_eq!(positions["1"], Position::new(0.0, 0.0));
        assert_eq!(positions["1.1"], Position::new(420.0, 0.0));
    }

    #[test]
    fn siblings_never_overlap() {
        let pairs = [
            ("1", "0"),
            ("2", "0"),
            ("1.1", "1"),
            ("1.2", "1"),
            ("2.1", "2"),
            ("1.1.1", "1.1"),
            ("2.1.1", "2.1"),
            ("2.1.2", "2.1"),
        ];
        let positions = layout(&pairs, LayoutConfig::default());
        let mut by_row: HashMap<i64, Vec<f64>> = HashMap::new();
        for pos in positions.values() {
            by_row.entry(pos.y as i64).or_default().push(pos.x);
        }
        for xs in by_row.values_mut() {
            xs.sort_by(f64::total_cmp);
            for pair in xs.windows(2) {
                assert!(pair[1] - pair[0] >= 400.0, "{xs:?}");
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let pairs = [("1", "0"), ("1.2", "1"), ("1.1", "1"), ("1.1.1", "1.1"), ("3", "0")];
        let first = layout(&pairs, LayoutConfig::default());
        for _ in 0..5 {
            assert_eq!(layout(&pairs, LayoutConfig::default()), first);
        }
    }

    #[test]
    fn cycles_still_place_every_node() {
        let (mut nodes, mut edges) = graph(&[("1", "2"), ("2", "1")]);
        nodes.push(HypothesisNode::from_record(&NodeRecord::new("3", "0", "x")));
        edges.push(Edge::from_key(&EdgeKey::new("1", "2")));
        let positions = LayoutEngine::default().layout(&nodes, &edges);
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn empty_graph_is_empty() {
        let nodes: [HypothesisNode; 0] = [];
        let edges: [Edge; 0] = [];
        assert!(LayoutEngine::default().layout(&nodes, &edges).is_empty());
    }
}
