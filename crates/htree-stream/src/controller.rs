//! Stream Controller
//!
//! Owns the request lifecycle for one workspace. At most one run is ever in
//! flight: `start` aborts the previous run and waits for it to hand the
//! session back before spawning the next, so two streams never write the
//! same graph.

use crate::client::AgentClient;
use crate::error::{StreamError, StreamResult};
use crate::handle::{StreamHandle, ViewState};
use crate::run::{run, RunContext, RunReport, RunSummary};
use htree_engine::{LayoutConfig, PacingConfig, TreeSession};
use htree_model::AgentRequest;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What to ask the agent for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Fresh analysis; the session is cleared first
    Generate(AgentRequest),
    /// Edit a node and resume analysis from it, keeping the rest of the tree
    Restart {
        /// Problem statement and scratchpad
        base: AgentRequest,
        /// Node to edit
        node_id: String,
        /// New label
        text: String,
        /// New reasoning
        reasoning: String,
    },
}

struct Running {
    handle: StreamHandle,
    task: JoinHandle<RunReport>,
}

/// Request lifecycle owner
pub struct StreamController {
    client: Arc<dyn AgentClient>,
    pacing: PacingConfig,
    layout: LayoutConfig,
    session: Option<TreeSession>,
    running: Option<Running>,
}

impl StreamController {
    /// Create a controller with default pacing and layout
    #[must_use]
    pub fn new(client: Arc<dyn AgentClient>) -> Self {
        Self {
            client,
            pacing: PacingConfig::default(),
            layout: LayoutConfig::default(),
            session: Some(TreeSession::default()),
            running: None,
        }
    }

    /// With pacing
    #[inline]
    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// With layout parameters; replaces the idle session
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self.session = Some(TreeSession::new(layout));
        self
    }

    /// Seed the idle session, e.g. with a tree loaded from disk
    #[must_use]
    pub fn with_session(mut self, session: TreeSession) -> Self {
        self.layout = *session.layout_config();
        self.session = Some(session);
        self
    }

    /// Start a run, aborting any run still in flight
    ///
    /// # Errors
    /// [`StreamError::Engine`] when a restart names an unknown node. The
    /// previous run's own failure is logged, not returned.
    pub async fn start(&mut self, query: Query) -> StreamResult<StreamHandle> {
        if let Some(previous) = self.running.as_ref() {
            tracing::info!("aborting previous run before starting a new one");
            previous.handle.abort();
        }
        if let Err(err) = self.finish().await {
            tracing::warn!(error = %err, "previous run ended with an error");
        }

        let mut session = self.take_session();
        let request = match query {
            Query::Generate(request) => {
                session.reset();
                request
            }
            Query::Restart {
                base,
                node_id,
                text,
                reasoning,
            } => match session.prepare_restart(base, &node_id, &text, &reasoning) {
                Ok(request) => request,
                Err(err) => {
                    self.session = Some(session);
                    return Err(err.into());
                }
            },
        };

        let cancel = CancellationToken::new();
        let (view_tx, view_rx) = watch::channel(ViewState {
            loading: true,
            ..ViewState::default()
        });
        let handle = StreamHandle::new(cancel.clone(), view_rx);
        let ctx = RunContext {
            client: Arc::clone(&self.client),
            request,
            pacing: self.pacing,
            cancel,
            view: view_tx,
        };

        tracing::info!("run started");
        let task = tokio::spawn(run(session, ctx));
        self.running = Some(Running {
            handle: handle.clone(),
            task,
        });
        Ok(handle)
    }

    /// Abort the current run, if any; idempotent
    pub fn abort(&self) {
        if let Some(running) = &self.running {
            running.handle.abort();
        }
    }

    /// Wait for the current run and take the session back
    ///
    /// Returns `Ok(None)` when nothing was running.
    ///
    /// # Errors
    /// The transport failure that ended the run, or [`StreamError::Join`]
    /// when the run task itself failed (the session is then replaced by an
    /// empty one).
    pub async fn finish(&mut self) -> StreamResult<Option<RunSummary>> {
        let Some(running) = self.running.take() else {
            return Ok(None);
        };
        match running.task.await {
            Ok(report) => {
                self.session = Some(report.session);
                report.result.map(Some)
            }
            Err(err) => {
                self.session = Some(TreeSession::new(self.layout));
                Err(StreamError::Join(err))
            }
        }
    }

    /// Whether a run is in flight
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Handle of the current run
    #[must_use]
    pub fn handle(&self) -> Option<&StreamHandle> {
        self.running.as_ref().map(|r| &r.handle)
    }

    /// The session, while no run holds it
    #[must_use]
    pub fn session(&self) -> Option<&TreeSession> {
        self.session.as_ref()
    }

    fn take_session(&mut self) -> TreeSession {
        self.session
            .take()
            .unwrap_or_else(|| TreeSession::new(self.layout))
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamController")
            .field("pacing", &self.pacing)
            .field("layout", &self.layout)
            .field("running", &self.running.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.abort();
    }
}
