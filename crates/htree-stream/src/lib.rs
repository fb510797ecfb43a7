//! htree Stream - the Stream Controller
//!
//! Drives a [`TreeSession`](htree_engine::TreeSession) from a live agent
//! response:
//! - [`AgentClient`]: where response bodies come from (HTTP or a recording)
//! - [`decoder`]: newline splitting with carry-over, NDJSON and SSE framing
//! - [`StreamController`]: one run at a time, cancellable, session reclaimed
//!   after every run
//! - [`StreamHandle`] / [`ViewState`]: abort and observe a run
//!
//! # Example
//!
//! ```rust,no_run
//! use htree_model::AgentRequest;
//! use htree_stream::{AgentConfig, HttpAgentClient, Query, StreamController};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), htree_stream::StreamError> {
//! let client = HttpAgentClient::new(&AgentConfig::default())?;
//! let mut controller = StreamController::new(Arc::new(client));
//!
//! let handle = controller
//!     .start(Query::Generate(AgentRequest::new("Why are sales declining?")))
//!     .await?;
//! let mut updates = handle.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow().clone();
//!     println!("{} nodes", state.snapshot.nodes.len());
//!     if !state.loading {
//!         break;
//!     }
//! }
//! let summary = controller.finish().await?;
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod handle;
mod run;

pub use client::{AgentClient, ByteStream, FileAgentClient, HttpAgentClient};
pub use config::AgentConfig;
pub use controller::{Query, StreamController};
pub use decoder::{classify, Frame, LineDecoder};
pub use error::{StreamError, StreamResult};
pub use handle::{StreamHandle, ViewState};
pub use run::{RunOutcome, RunReport, RunSummary};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving runs
    pub use crate::{
        AgentClient, AgentConfig, Query, RunOutcome, RunSummary, StreamController, StreamHandle,
        ViewState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
