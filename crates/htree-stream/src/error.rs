//! Error types for the stream controller
//!
//! Only failures that end a run are errors. Malformed lines are skipped by
//! the decoder, and a caller-initiated abort ends the run with
//! [`RunOutcome::Aborted`](crate::RunOutcome::Aborted), never with an error.

/// Stream controller error type
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Backend answered with a non-success status
    #[error("agent returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Connection or body read failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Reading a recorded stream failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The session rejected the query, e.g. a restart from an unknown node
    #[error("engine error: {0}")]
    Engine(#[from] htree_engine::EngineError),

    /// Invalid client configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The run task panicked or was torn down
    #[error("run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StreamError {
    /// Whether the failure came from the network rather than local setup
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Transport(_))
    }
}

/// Result alias for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
