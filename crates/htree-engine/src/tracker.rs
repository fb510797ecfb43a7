//! Status Tracker
//!
//! Per-node work status and phase timings, kept in a side table keyed by
//! node id (entries may exist before the node itself arrives).
//!
//! "Working" is a single global cursor: the [`ActiveItem`] slot. Starting a
//! phase on a different node first closes whatever the cursor pointed at, so
//! at most one node is ever working.
//!
//! Time comes from [`tokio::time::Instant`] so tests can drive it with a
//! paused clock.

use htree_model::{NodeStatus, Phase, StatusView, Step};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Status side-table entry for one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStatusMeta {
    /// Idle or working
    pub status: NodeStatus,
    /// Open phase
    pub phase: Option<Phase>,
    /// Display label of the open step
    pub phase_label: Option<&'static str>,
    /// When the open phase started
    pub phase_started_at: Option<Instant>,
    /// Accumulated time per closed phase
    pub durations: BTreeMap<Phase, Duration>,
    /// Time from work start to first appearance in the store
    pub created_ms: Option<u64>,
}

impl NodeStatusMeta {
    /// Accumulate the open phase's elapsed time, leaving it open
    fn accumulate(&mut self, now: Instant) {
        if let (Some(phase), Some(started)) = (self.phase, self.phase_started_at) {
            *self.durations.entry(phase).or_default() += now.saturating_duration_since(started);
        }
    }

    /// Accumulate and clear the open phase
    fn close(&mut self, now: Instant) {
        self.accumulate(now);
        self.status = NodeStatus::Idle;
        self.phase = None;
        self.phase_label = None;
        self.phase_started_at = None;
    }

    /// Total accumulated time for a phase
    #[inline]
    #[must_use]
    pub fn duration(&self, phase: Phase) -> Duration {
        self.durations.get(&phase).copied().unwrap_or_default()
    }

    /// Serializable view at `now`
    #[must_use]
    pub fn view(&self, now: Instant) -> StatusView {
        StatusView {
            status: self.status,
            phase: self.phase,
            phase_label: self.phase_label.map(str::to_string),
            phase_elapsed_ms: self
                .phase_started_at
                .map(|started| millis(now.saturating_duration_since(started))),
            durations_ms: self.durations.iter().map(|(p, d)| (*p, millis(*d))).collect(),
            created_ms: self.created_ms,
        }
    }
}

/// The single work cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveItem {
    /// Node being worked on
    pub id: String,
    /// Step in progress
    pub step: Step,
    /// When the step started
    pub started_at: Instant,
}

/// Tracks which node is working and how long each phase took
#[derive(Debug, Default)]
pub struct StatusTracker {
    metas: HashMap<String, NodeStatusMeta>,
    active: Option<ActiveItem>,
}

impl StatusTracker {
    /// Create empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `step` on `node_id`
    ///
    /// Closes the cursor's previous node if it differs, then accumulates any
    /// phase already open on `node_id` before switching to the new one.
    pub fn start_phase(&mut self, node_id: &str, step: Step) {
        let now = Instant::now();

        if let Some(previous) = self.active.take() {
            if previous.id != node_id {
                if let Some(meta) = self.metas.get_mut(&previous.id) {
                    meta.close(now);
                }
            }
        }

        let meta = self.metas.entry(node_id.to_string()).or_default();
        meta.accumulate(now);
        meta.status = NodeStatus::Working;
        meta.phase = Some(step.phase());
        meta.phase_label = Some(step.label());
        meta.phase_started_at = Some(now);

        self.active = Some(ActiveItem {
            id: node_id.to_string(),
            step,
            started_at: now,
        });
        tracing::debug!(node = node_id, phase = %step.phase(), "phase started");
    }

    /// Start a step given by its backend name
    ///
    /// Unknown names are ignored. Returns whether a phase was started.
    pub fn start_phase_named(&mut self, node_id: &str, step_name: &str) -> bool {
        match Step::from_name(step_name) {
            Some(step) => {
                self.start_phase(node_id, step);
                true
            }
            None => {
                tracing::debug!(node = node_id, step = step_name, "ignoring unknown step");
                false
            }
        }
    }

    /// Close the open phase on `node_id` and mark it idle
    pub fn finish_phase(&mut self, node_id: &str) {
        let now = Instant::now();
        self.metas.entry(node_id.to_string()).or_default().close(now);
        if self.active.as_ref().is_some_and(|a| a.id == node_id) {
            self.active = None;
        }
        tracing::debug!(node = node_id, "phase finished");
    }

    /// Close whatever the cursor points at, returning its id
    pub fn finish_active(&mut self) -> Option<String> {
        let id = self.active.as_ref()?.id.clone();
        self.finish_phase(&id);
        Some(id)
    }

    /// Record the node's first appearance
    ///
    /// When the cursor points at this id, the time since its work started is
    /// the creation latency; otherwise the node appeared without tracked work
    /// and gets zero. Later calls are no-ops.
    pub fn note_created(&mut self, node_id: &str) {
        let now = Instant::now();
        let started = self
            .active
            .as_ref()
            .filter(|a| a.id == node_id)
            .map(|a| a.started_at);
        let meta = self.metas.entry(node_id.to_string()).or_default();
        if meta.created_ms.is_none() {
            meta.created_ms = Some(started.map_or(0, |s| millis(now.saturating_duration_since(s))));
        }
    }

    /// Status of a node, default (idle) when never seen
    #[must_use]
    pub fn get_meta(&self, node_id: &str) -> NodeStatusMeta {
        self.metas.get(node_id).cloned().unwrap_or_default()
    }

    /// Borrow a node's entry
    #[inline]
    #[must_use]
    pub fn meta(&self, node_id: &str) -> Option<&NodeStatusMeta> {
        self.metas.get(node_id)
    }

    /// Serializable view of a node's status
    #[must_use]
    pub fn view(&self, node_id: &str, now: Instant) -> StatusView {
        self.metas
            .get(node_id)
            .map(|m| m.view(now))
            .unwrap_or_default()
    }

    /// Current work cursor
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&ActiveItem> {
        self.active.as_ref()
    }

    /// Drop a node's entry, releasing the cursor if it pointed there
    pub fn forget(&mut self, node_id: &str) {
        self.metas.remove(node_id);
        if self.active.as_ref().is_some_and(|a| a.id == node_id) {
            self.active = None;
        }
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.metas.clear();
        self.active = None;
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
