//! htree Model - wire and domain types
//!
//! Shared vocabulary for every htree crate:
//! - Boundary records exchanged with the agent backend ([`NodeRecord`],
//!   [`StreamMessage`], [`AgentRequest`])
//! - Canonical graph entities ([`HypothesisNode`], [`Edge`], [`Position`])
//! - Work-status vocabulary ([`Step`], [`Phase`], [`NodeStatus`])
//! - Render snapshots handed to a drawing surface ([`GraphSnapshot`])
//!
//! # Example
//!
//! ```rust
//! use htree_model::StreamMessage;
//!
//! let line = r#"{"hypothesis_tree":[{"id":"1","parent_id":"0","text":"Root","reasoning":"","is_leaf":false}]}"#;
//! let message: StreamMessage = serde_json::from_str(line).unwrap();
//! assert_eq!(message.hypothesis_tree.len(), 1);
//! assert!(message.hypothesis_tree[0].parent().is_none());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod id;
pub mod node;
pub mod record;
pub mod snapshot;
pub mod status;

pub use error::ModelError;
pub use id::{DottedId, ROOT_SENTINEL};
pub use node::{Edge, EdgeKey, HypothesisNode, Position};
pub use record::{Activity, AgentRequest, NodeRecord, StreamMessage};
pub use snapshot::{GraphSnapshot, RenderNode, StatusView};
pub use status::{NodeStatus, Phase, Step};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
