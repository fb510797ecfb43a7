//! Terminal output
//!
//! Progress lines while a run streams, and an indented tree of the final
//! snapshot.

use htree_model::{GraphSnapshot, RenderNode};
use htree_stream::ViewState;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

const PREVIEW_CHARS: usize = 80;

/// Prints only what changed between two view states
#[derive(Debug, Default)]
pub struct ProgressPrinter {
    transcript_seen: usize,
    nodes_seen: HashSet<String>,
}

impl ProgressPrinter {
    /// Lines describing what is new in `state`
    pub fn progress(&mut self, state: &ViewState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.transcript.len() < self.transcript_seen {
            self.transcript_seen = 0;
        }
        for entry in &state.transcript[self.transcript_seen..] {
            lines.push(format!("[{}] {}", entry.received_at.format("%H:%M:%S"), entry.line));
        }
        self.transcript_seen = state.transcript.len();

        for node in &state.snapshot.nodes {
            if self.nodes_seen.insert(node.id().to_string()) {
                lines.push(format!("  + {} {}", node.id(), node.node.label));
            }
        }
        lines
    }
}

/// Write an indented tree, children under their edge parent, in first-seen order
///
/// # Errors
/// Failure writing to `out`.
pub fn render_tree<W: Write>(out: &mut W, snapshot: &GraphSnapshot) -> io::Result<()> {
    let by_id: HashMap<&str, &RenderNode> = snapshot.nodes.iter().map(|n| (n.id(), n)).collect();
    let mut children: HashMap<&str, Vec<&RenderNode>> = HashMap::new();
    let mut has_parent: HashSet<&str> = HashSet::new();
    for edge in &snapshot.edges {
        if let (Some(_), Some(child)) = (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str())) {
            children.entry(edge.source.as_str()).or_default().push(*child);
            has_parent.insert(edge.target.as_str());
        }
    }

    let mut visited = HashSet::new();
    for root in snapshot.nodes.iter().filter(|n| !has_parent.contains(n.id())) {
        write_node(out, root, 0, &children, &mut visited)?;
    }
    Ok(())
}

fn write_node<'a, W: Write>(
    out: &mut W,
    node: &'a RenderNode,
    depth: usize,
    children: &HashMap<&str, Vec<&'a RenderNode>>,
    visited: &mut HashSet<&'a str>,
) -> io::Result<()> {
    if !visited.insert(node.id()) {
        return Ok(());
    }
    let indent = "  ".repeat(depth);
    let leaf = if node.node.is_leaf { " [leaf]" } else { "" };
    let pos = node.position();
    writeln!(out, "{indent}{} {}{leaf}  @({:.0}, {:.0})", node.id(), node.node.label, pos.x, pos.y)?;

    let reasoning = node.node.reasoning_preview(PREVIEW_CHARS);
    if !reasoning.is_empty() {
        writeln!(out, "{indent}    ↳ {reasoning}")?;
    }
    if !node.node.tools_used.is_empty() {
        writeln!(out, "{indent}    tools: {}", node.node.tools_used.join(", "))?;
    }
    let timings: Vec<String> = node
        .meta
        .durations_ms
        .iter()
        .map(|(phase, ms)| format!("{phase} {ms}ms"))
        .collect();
    if !timings.is_empty() {
        writeln!(out, "{indent}    time: {}", timings.join(", "))?;
    }

    for child in children.get(node.id()).into_iter().flatten() {
        write_node(out, child, depth + 1, children, visited)?;
    }
    Ok(())
}
