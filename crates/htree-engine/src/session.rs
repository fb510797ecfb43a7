//! Tree session
//!
//! [`TreeSession`] owns every piece of ingestion state for one workspace:
//! the graph store, the status tracker, the arrival queue and the
//! explainability transcript. It is the only thing that mutates them.
//!
//! Message application order:
//! 1. transcript gets the newest log entry
//! 2. status: an explicit `activity` wins, otherwise the newest log line is
//!    interpreted (only when it changed since the previous message)
//! 3. `last_completed_item_id` closes that item's phase
//! 4. tree delta: known ids merge immediately, first sightings queue
//!
//! Layout is never run inline. Mutations set a dirty flag and the driver
//! calls [`TreeSession::render_if_pending`] once per frame, so any number of
//! mutations inside one frame cost one layout pass.

use crate::error::{EngineError, EngineResult};
use crate::interpreter;
use crate::layout::{LayoutConfig, LayoutEngine};
use crate::queue::ArrivalQueue;
use crate::store::{GraphStore, UpsertOutcome};
use crate::tracker::StatusTracker;
use chrono::{DateTime, Utc};
use htree_model::{AgentRequest, DottedId, GraphSnapshot, StreamMessage};
use serde::{Deserialize, Serialize};

/// Transcript line written when a restart begins
pub const RESTART_SEPARATOR: &str = "--- RESTARTING ANALYSIS ---";

/// One explainability line as received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Wall-clock receive time
    pub received_at: DateTime<Utc>,
    /// Log text
    pub line: String,
}

/// What one message changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Known nodes merged in place
    pub updated: usize,
    /// First sightings added to the arrival queue
    pub queued: usize,
    /// Whether any status changed
    pub status_changed: bool,
}

/// Owned ingestion state for one workspace
#[derive(Debug)]
pub struct TreeSession {
    store: GraphStore,
    tracker: StatusTracker,
    queue: ArrivalQueue,
    layout: LayoutEngine,
    transcript: Vec<TranscriptEntry>,
    last_log: Option<String>,
    layout_pending: bool,
    revision: u64,
}

impl TreeSession {
    /// Create an empty session laid out with `config`
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_layout(LayoutEngine::new(config))
    }

    /// Create an empty session with a custom layout engine
    #[must_use]
    pub fn with_layout(layout: LayoutEngine) -> Self {
        Self {
            store: GraphStore::new(),
            tracker: StatusTracker::new(),
            queue: ArrivalQueue::new(),
            layout,
            transcript: Vec::new(),
            last_log: None,
            layout_pending: false,
            revision: 0,
        }
    }

    /// Apply one decoded stream message
    pub fn apply_message(&mut self, message: &StreamMessage) -> ApplyReport {
        let mut report = ApplyReport::default();

        let fresh_log = message
            .latest_log()
            .filter(|line| self.last_log.as_deref() != Some(*line))
            .map(str::to_string);
        if let Some(line) = &fresh_log {
            self.push_transcript(line.clone());
            self.last_log = Some(line.clone());
        }

        match &message.activity {
            Some(activity) if activity.is_working() => {
                report.status_changed |= self.tracker.start_phase_named(&activity.item_id, &activity.node);
            }
            _ => {
                if let Some(line) = &fresh_log {
                    let signal = interpreter::interpret(line);
                    if let Some((step, id)) = signal.actionable() {
                        self.tracker.start_phase(id, step);
                        report.status_changed = true;
                    }
                }
            }
        }

        if let Some(done) = &message.last_completed_item_id {
            self.tracker.finish_phase(done);
            report.status_changed = true;
        }

        for record in &message.hypothesis_tree {
            if self.store.contains(&record.id) {
                self.store.upsert_node(record);
                report.updated += 1;
            } else if self.queue.push(record.clone()) {
                report.queued += 1;
            }
        }

        if fresh_log.is_some() || report.status_changed || report.updated > 0 {
            self.request_layout();
        }
        tracing::debug!(
            updated = report.updated,
            queued = report.queued,
            status_changed = report.status_changed,
            pending = self.queue.len(),
            "message applied"
        );
        report
    }

    /// Promote the oldest queued record into the store
    pub fn promote_next(&mut self) -> Option<String> {
        let record = self.queue.pop()?;
        if self.store.upsert_node(&record) == UpsertOutcome::Inserted {
            self.tracker.note_created(&record.id);
        }
        self.request_layout();
        tracing::debug!(node = %record.id, remaining = self.queue.len(), "node promoted");
        Some(record.id)
    }

    /// Promote everything queued at once, returning how many were promoted
    pub fn drain_queue(&mut self) -> usize {
        let mut promoted = 0;
        while self.promote_next().is_some() {
            promoted += 1;
        }
        promoted
    }

    /// End of a run: drain the queue, release the work cursor and lay out
    pub fn complete(&mut self) -> GraphSnapshot {
        let drained = self.drain_queue();
        if let Some(id) = self.tracker.finish_active() {
            tracing::debug!(node = %id, "closing phase left open at end of run");
        }
        tracing::debug!(drained, nodes = self.store.len(), "session completed");
        self.render()
    }

    /// Mark the layout dirty
    #[inline]
    pub fn request_layout(&mut self) {
        self.layout_pending = true;
    }

    /// Whether a layout pass is owed
    #[inline]
    #[must_use]
    pub fn layout_pending(&self) -> bool {
        self.layout_pending
    }

    /// Lay out and snapshot only if something changed since the last render
    pub fn render_if_pending(&mut self) -> Option<GraphSnapshot> {
        if self.layout_pending {
            Some(self.render())
        } else {
            None
        }
    }

    /// Lay out unconditionally and snapshot
    pub fn render(&mut self) -> GraphSnapshot {
        let positions = self.layout.layout(self.store.nodes(), self.store.edges());
        self.store.apply_positions(&positions);
        self.layout_pending = false;
        self.revision += 1;
        self.snapshot()
    }

    /// Snapshot of the current positions without laying out
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot(&self.tracker, self.revision)
    }

    /// Edit a node and build the request that resumes analysis from it
    ///
    /// The node's label and reasoning are replaced, its descendants are
    /// discarded along with their status, and queued first sightings are
    /// dropped. `base` supplies the problem statement and scratchpad.
    ///
    /// # Errors
    /// - [`EngineError::Model`] when `node_id` is not a dotted id
    /// - [`EngineError::EmptyTree`] when nothing has been ingested
    /// - [`EngineError::NodeNotFound`] when the node was never promoted
    pub fn prepare_restart(
        &mut self,
        base: AgentRequest,
        node_id: &str,
        text: &str,
        reasoning: &str,
    ) -> EngineResult<AgentRequest> {
        let node_id: DottedId = node_id.parse()?;
        if self.store.is_empty() {
            return Err(EngineError::EmptyTree);
        }
        self.store.edit_node(node_id.as_str(), text, reasoning)?;

        let discarded = self.store.descendants(node_id.as_str());
        self.store.remove_nodes(&discarded);
        for id in &discarded {
            self.tracker.forget(id);
        }
        self.queue.clear();
        self.push_transcript(RESTART_SEPARATOR.to_string());
        self.last_log = None;
        self.request_layout();

        tracing::info!(node = %node_id, discarded = discarded.len(), "restart prepared");
        Ok(base.with_restart(self.store.export_tree(), node_id.as_str()))
    }

    /// Forget everything, ready for a fresh generation
    pub fn reset(&mut self) {
        self.store.clear();
        self.tracker.clear();
        self.queue.clear();
        self.transcript.clear();
        self.last_log = None;
        self.request_layout();
    }

    fn push_transcript(&mut self, line: String) {
        self.transcript.push(TranscriptEntry {
            received_at: Utc::now(),
            line,
        });
    }

    /// Graph store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Status tracker
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// Number of first sightings waiting for promotion
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Explainability transcript, oldest first
    #[inline]
    #[must_use]
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Layout parameters
    #[inline]
    #[must_use]
    pub fn layout_config(&self) -> &LayoutConfig {
        self.layout.config()
    }
}

impl Default for TreeSession {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
