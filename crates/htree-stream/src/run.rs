//! The run loop
//!
//! One task per run, interleaving four event sources with `select!`:
//! abort, the arrival tick, the frame tick and the next body chunk. The
//! task owns the [`TreeSession`] for its lifetime and hands it back in the
//! [`RunReport`], so no other writer can touch the graph mid-run.
//!
//! Every exit path (end of body, `[DONE]`, abort, transport failure) goes
//! through the same completion: stop pacing, drain the arrival queue, lay
//! out and publish `loading = false`.

use crate::client::AgentClient;
use crate::decoder::{classify, Frame, LineDecoder};
use crate::error::{StreamError, StreamResult};
use crate::handle::ViewState;
use futures::StreamExt;
use htree_engine::{ArrivalScheduler, PacingConfig, TreeSession};
use htree_model::{AgentRequest, GraphSnapshot};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Body ended or the `[DONE]` sentinel arrived
    Completed,
    /// Caller aborted
    Aborted,
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// How the run ended
    pub outcome: RunOutcome,
    /// Messages applied
    pub messages: usize,
    /// Lines dropped as malformed
    pub malformed: usize,
    /// Nodes in the store at the end
    pub nodes: usize,
    /// Edges in the store at the end
    pub edges: usize,
}

/// Session plus result, returned by the run task
#[derive(Debug)]
pub struct RunReport {
    /// The session, handed back to its owner
    pub session: TreeSession,
    /// Summary, or the failure that ended the run
    pub result: StreamResult<RunSummary>,
}

/// Inputs of one run
pub(crate) struct RunContext {
    pub(crate) client: Arc<dyn AgentClient>,
    pub(crate) request: AgentRequest,
    pub(crate) pacing: PacingConfig,
    pub(crate) cancel: CancellationToken,
    pub(crate) view: watch::Sender<ViewState>,
}

enum End {
    Completed,
    Aborted,
    Failed(StreamError),
}

#[derive(Default)]
struct Counters {
    messages: usize,
    malformed: usize,
}

/// Drive one run to completion
pub(crate) async fn run(mut session: TreeSession, ctx: RunContext) -> RunReport {
    publish(&ctx.view, &session, session.snapshot(), true, None);

    let mut counters = Counters::default();
    let end = tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => End::Aborted,
        opened = ctx.client.open(&ctx.request) => match opened {
            Ok(body) => pump(&mut session, body, &ctx, &mut counters).await,
            Err(err) => End::Failed(err),
        },
    };

    let snapshot = session.complete();
    let (result, error) = match end {
        End::Completed => (Ok(RunOutcome::Completed), None),
        End::Aborted => (Ok(RunOutcome::Aborted), None),
        End::Failed(err) => {
            tracing::error!(error = %err, "agent stream failed");
            let message = err.to_string();
            (Err(err), Some(message))
        }
    };
    let result = result.map(|outcome| RunSummary {
        outcome,
        messages: counters.messages,
        malformed: counters.malformed,
        nodes: session.store().len(),
        edges: session.store().edge_count(),
    });
    if let Ok(summary) = &result {
        tracing::info!(
            outcome = ?summary.outcome,
            messages = summary.messages,
            malformed = summary.malformed,
            nodes = summary.nodes,
            "run finished"
        );
    }

    publish(&ctx.view, &session, snapshot, false, error);
    RunReport { session, result }
}

async fn pump(
    session: &mut TreeSession,
    mut body: crate::client::ByteStream,
    ctx: &RunContext,
    counters: &mut Counters,
) -> End {
    let mut decoder = LineDecoder::new();
    let mut arrivals = ArrivalScheduler::new(ctx.pacing.arrival_interval());
    let mut frames = interval(ctx.pacing.frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let end = 'read: loop {
        // Ticks rank ahead of the body so a body that is always ready
        // cannot starve pacing.
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break 'read End::Aborted,
            _ = arrivals.tick() => {
                session.promote_next();
            }
            _ = frames.tick() => {
                if let Some(snapshot) = session.render_if_pending() {
                    publish(&ctx.view, session, snapshot, true, None);
                }
            }
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for line in decoder.push(&bytes) {
                        if apply_line(session, &line, counters) {
                            break 'read End::Completed;
                        }
                    }
                    // Let the timer driver run between buffered chunks.
                    tokio::task::yield_now().await;
                }
                Some(Err(err)) => break 'read End::Failed(err),
                None => {
                    if let Some(line) = decoder.finish() {
                        apply_line(session, &line, counters);
                    }
                    break 'read End::Completed;
                }
            },
        }
    };

    arrivals.stop();
    if decoder.pending() > 0 && !matches!(end, End::Completed) {
        tracing::debug!(bytes = decoder.pending(), "discarding truncated line");
    }
    end
}

/// Apply one line; returns `true` on the end sentinel
fn apply_line(session: &mut TreeSession, line: &str, counters: &mut Counters) -> bool {
    match classify(line) {
        Frame::Message(message) => {
            session.apply_message(&message);
            counters.messages += 1;
            false
        }
        Frame::Done => {
            tracing::debug!("end sentinel received");
            true
        }
        Frame::Skip => false,
        Frame::Malformed(reason) => {
            counters.malformed += 1;
            tracing::warn!(%reason, line = %preview(line), "dropping malformed line");
            false
        }
    }
}

fn preview(line: &str) -> &str {
    const MAX: usize = 120;
    if line.len() <= MAX {
        return line;
    }
    let cut = (0..=MAX).rev().find(|i| line.is_char_boundary(*i)).unwrap_or(0);
    &line[..cut]
}

fn publish(
    view: &watch::Sender<ViewState>,
    session: &TreeSession,
    snapshot: GraphSnapshot,
    loading: bool,
    error: Option<String>,
) {
    view.send_replace(ViewState {
        loading,
        snapshot,
        transcript: session.transcript().to_vec(),
        pending: session.pending(),
        error,
    });
}
