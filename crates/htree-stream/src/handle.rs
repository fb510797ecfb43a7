//! Run handle and published view state

use htree_engine::TranscriptEntry;
use htree_model::GraphSnapshot;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Everything a rendering surface needs, republished once per frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    /// A run is in flight
    pub loading: bool,
    /// Laid-out graph
    pub snapshot: GraphSnapshot,
    /// Explainability transcript
    pub transcript: Vec<TranscriptEntry>,
    /// First sightings not yet promoted
    pub pending: usize,
    /// Transport failure that ended the run
    pub error: Option<String>,
}

/// Cancellable handle to one run
///
/// Cheap to clone. Aborting is idempotent and never fails.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    cancel: CancellationToken,
    view: watch::Receiver<ViewState>,
}

impl StreamHandle {
    pub(crate) fn new(cancel: CancellationToken, view: watch::Receiver<ViewState>) -> Self {
        Self { cancel, view }
    }

    /// Ask the run to stop; the queue is still drained
    pub fn abort(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("abort requested");
        }
        self.cancel.cancel();
    }

    /// Whether abort was requested
    #[inline]
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Latest published state
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// Subscribe to state updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    /// Wait until the run has published its final state
    pub async fn finished(&mut self) -> ViewState {
        if let Ok(state) = self.view.wait_for(|state| !state.loading).await {
            return state.clone();
        }
        self.view.borrow().clone()
    }
}
