//! htree Engine - streaming tree ingestion and layout
//!
//! Turns decoded agent messages into a laid-out hypothesis graph:
//! - [`interpreter`]: free-text progress lines → `(step, item id)`
//! - [`tracker`]: per-node working/idle status with phase timings
//! - [`store`]: canonical node and edge maps with merge semantics
//! - [`queue`] and [`scheduler`]: paced promotion of first sightings
//! - [`layout`]: layered placement of the current graph
//! - [`session`]: the owned facade tying them together
//!
//! Everything here is synchronous apart from the scheduler tick; the
//! stream crate drives a [`TreeSession`] from its run loop.
//!
//! # Example
//!
//! ```rust
//! use htree_engine::prelude::*;
//! use htree_model::{NodeRecord, StreamMessage};
//!
//! let mut session = TreeSession::default();
//! session.apply_message(&StreamMessage {
//!     hypothesis_tree: vec![NodeRecord::new("1", "0", "Root")],
//!     ..StreamMessage::default()
//! });
//! assert_eq!(session.pending(), 1);
//!
//! let snapshot = session.complete();
//! assert_eq!(snapshot.nodes.len(), 1);
//! assert!(snapshot.edges.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod interpreter;
pub mod layout;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod tracker;

pub use config::PacingConfig;
pub use error::{EngineError, EngineResult};
pub use interpreter::{interpret, LogSignal};
pub use layout::{LayeredLayout, LayoutAlgorithm, LayoutConfig, LayoutEngine, RankDir};
pub use queue::ArrivalQueue;
pub use scheduler::ArrivalScheduler;
pub use session::{ApplyReport, TranscriptEntry, TreeSession, RESTART_SEPARATOR};
pub use store::{GraphStore, UpsertOutcome};
pub use tracker::{ActiveItem, NodeStatusMeta, StatusTracker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        ArrivalScheduler, EngineError, LayoutConfig, PacingConfig, RankDir, TreeSession,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
