//! Subcommand implementations

use crate::config::CliConfig;
use crate::output::{render_tree, ProgressPrinter};
use anyhow::Context;
use htree_engine::TreeSession;
use htree_model::{AgentRequest, GraphSnapshot, NodeRecord, StreamMessage};
use htree_stream::{
    AgentClient, FileAgentClient, HttpAgentClient, Query, RunOutcome, StreamController,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Fresh analysis against the live agent, progress and result written to `out`
///
/// # Errors
/// Bad configuration, a transport failure or a failed write.
pub async fn run<W: Write>(
    config: &CliConfig,
    problem: &str,
    scratchpad: Option<&str>,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let client = HttpAgentClient::new(&config.agent).context("building agent client")?;
    let mut request = AgentRequest::new(problem);
    if let Some(id) = scratchpad {
        request = request.with_scratchpad(id);
    }
    let controller = controller(config, Arc::new(client), TreeSession::new(config.layout));
    drive(controller, Query::Generate(request), json, out).await
}

/// Replay a recorded body through the full pipeline
///
/// # Errors
/// The recording cannot be read, or a failed write.
pub async fn replay<W: Write>(
    config: &CliConfig,
    file: &Path,
    chunk_size: usize,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let client = FileAgentClient::new(file).with_chunk_size(chunk_size);
    let request = AgentRequest::new(format!("replay of {}", file.display()));
    let controller = controller(config, Arc::new(client), TreeSession::new(config.layout));
    drive(controller, Query::Generate(request), json, out).await
}

/// Arguments of `htree restart`
#[derive(Debug, Clone)]
pub struct RestartArgs<'a> {
    /// Saved tree file
    pub tree: &'a Path,
    /// Node to edit
    pub node: &'a str,
    /// New text
    pub text: &'a str,
    /// New reasoning
    pub reasoning: &'a str,
    /// Problem statement
    pub problem: &'a str,
}

/// Edit a node of a saved tree and resume analysis from it
///
/// # Errors
/// Unreadable tree, unknown node, a transport failure or a failed write.
pub async fn restart<W: Write>(config: &CliConfig, args: RestartArgs<'_>, json: bool, out: &mut W) -> anyhow::Result<()> {
    let session = load_session(config, args.tree)?;
    let client = HttpAgentClient::new(&config.agent).context("building agent client")?;
    let query = Query::Restart {
        base: AgentRequest::new(args.problem),
        node_id: args.node.to_string(),
        text: args.text.to_string(),
        reasoning: args.reasoning.to_string(),
    };
    drive(controller(config, Arc::new(client), session), query, json, out).await
}

/// Lay out a saved tree without contacting the agent
///
/// # Errors
/// Unreadable tree file or a failed write.
pub fn layout<W: Write>(config: &CliConfig, tree: &Path, json: bool, out: &mut W) -> anyhow::Result<()> {
    let mut session = load_session(config, tree)?;
    let snapshot = session.render();
    write_snapshot(out, &snapshot, json)
}

/// Session holding every record of a saved `NodeRecord[]` file
///
/// # Errors
/// The file cannot be read or is not a JSON array of records.
pub fn load_session(config: &CliConfig, path: &Path) -> anyhow::Result<TreeSession> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading tree {}", path.display()))?;
    let records: Vec<NodeRecord> =
        serde_json::from_str(&text).with_context(|| format!("parsing tree {}", path.display()))?;

    let mut session = TreeSession::new(config.layout);
    session.apply_message(&StreamMessage {
        hypothesis_tree: records,
        ..StreamMessage::default()
    });
    session.drain_queue();
    tracing::info!(nodes = session.store().len(), path = %path.display(), "tree loaded");
    Ok(session)
}

fn controller(config: &CliConfig, client: Arc<dyn AgentClient>, session: TreeSession) -> StreamController {
    StreamController::new(client)
        .with_pacing(config.pacing)
        .with_session(session)
}

/// Start `query`, print progress until the run ends, abort on Ctrl-C
async fn drive<W: Write>(mut controller: StreamController, query: Query, json: bool, out: &mut W) -> anyhow::Result<()> {
    let handle = controller.start(query).await?;
    let mut updates = handle.subscribe();
    let mut printer = ProgressPrinter::default();
    let mut listen_for_ctrl_c = true;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !json {
                    for line in printer.progress(&state) {
                        writeln!(out, "{line}")?;
                    }
                }
                if !state.loading {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if listen_for_ctrl_c => match signal {
                Ok(()) => {
                    eprintln!("aborting...");
                    handle.abort();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "cannot listen for Ctrl-C");
                    listen_for_ctrl_c = false;
                }
            },
        }
    }

    let summary = controller.finish().await?;
    let snapshot = handle.state().snapshot;
    write_snapshot(out, &snapshot, json)?;

    if let Some(summary) = summary {
        if summary.outcome == RunOutcome::Aborted {
            eprintln!("run aborted; {} nodes kept", summary.nodes);
        }
        tracing::info!(
            messages = summary.messages,
            malformed = summary.malformed,
            nodes = summary.nodes,
            edges = summary.edges,
            "done"
        );
    }
    Ok(())
}

fn write_snapshot<W: Write>(out: &mut W, snapshot: &GraphSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, snapshot).context("serializing snapshot")?;
        writeln!(out)?;
    } else {
        render_tree(out, snapshot)?;
    }
    out.flush()?;
    Ok(())
}
