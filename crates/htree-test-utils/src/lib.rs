//! Testing utilities for the htree workspace
//!
//! Message fixtures, body builders for both stream framings, and a scripted
//! [`AgentClient`] that replays chunks with pauses, failures or an endless
//! hang.

#![allow(missing_docs)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use htree_model::{Activity, AgentRequest, NodeRecord, StreamMessage};
use htree_stream::{AgentClient, ByteStream, StreamError, StreamResult};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;

pub fn record(id: &str, parent: &str, text: &str) -> NodeRecord {
    NodeRecord::new(id, parent, text)
}

pub fn tree_message(records: Vec<NodeRecord>) -> StreamMessage {
    StreamMessage {
        hypothesis_tree: records,
        ..StreamMessage::default()
    }
}

pub fn log_message(line: &str) -> StreamMessage {
    StreamMessage {
        explainability_log: vec![line.to_string()],
        ..StreamMessage::default()
    }
}

pub fn completed_message(id: &str) -> StreamMessage {
    StreamMessage {
        last_completed_item_id: Some(id.to_string()),
        ..StreamMessage::default()
    }
}

pub fn activity_message(step: &str, id: &str) -> StreamMessage {
    StreamMessage {
        activity: Some(Activity {
            node: step.to_string(),
            item_id: id.to_string(),
            status: "working".to_string(),
        }),
        ..StreamMessage::default()
    }
}

/// A small realistic run: formulate, break down, classify
pub fn sample_run() -> Vec<StreamMessage> {
    vec![
        log_message("Step: formulate_top_hypothesis"),
        StreamMessage {
            explainability_log: vec!["Formulated top hypothesis (1): 'Margins eroded'.".into()],
            hypothesis_tree: vec![record("1", "0", "Margins eroded")],
            ..StreamMessage::default()
        },
        completed_message("1"),
        log_message("Broke down hypothesis (1) 'Margins eroded'."),
        tree_message(vec![
            record("1", "0", "Margins eroded"),
            record("1.1", "1", "Input costs rose"),
            record("1.2", "1", "Prices were cut"),
        ]),
        log_message("Step completed: classify_hypothesis for 1.1"),
        tree_message(vec![record("1.1", "1", "Input costs rose").with_leaf(true)]),
    ]
}

pub fn ndjson_body(messages: &[StreamMessage]) -> Bytes {
    let mut body = String::new();
    for message in messages {
        body.push_str(&serde_json::to_string(message).unwrap());
        body.push('\n');
    }
    Bytes::from(body)
}

pub fn sse_body(messages: &[StreamMessage]) -> Bytes {
    let mut body = String::new();
    for message in messages {
        body.push_str("data: ");
        body.push_str(&serde_json::to_string(message).unwrap());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    Bytes::from(body)
}

pub fn chunked(body: &Bytes, size: usize) -> Vec<Bytes> {
    let size = size.max(1);
    (0..body.len())
        .step_by(size)
        .map(|start| body.slice(start..body.len().min(start + size)))
        .collect()
}

/// One step of a scripted response body
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Chunk(Bytes),
    Pause(Duration),
    Fail(String),
    Hang,
}

/// Replays a fixed script for every request and records what was asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    steps: Vec<ScriptStep>,
    open_error: Option<u16>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Body delivered as `chunks`, no pauses
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        Self::new(chunks.into_iter().map(ScriptStep::Chunk).collect())
    }

    /// Body delivered with `pause` before every chunk
    pub fn paced(chunks: Vec<Bytes>, pause: Duration) -> Self {
        Self::new(
            chunks
                .into_iter()
                .flat_map(|chunk| [ScriptStep::Pause(pause), ScriptStep::Chunk(chunk)])
                .collect(),
        )
    }

    /// Answer every request with an HTTP error status
    pub fn failing_open(status: u16) -> Self {
        Self {
            open_error: Some(status),
            ..Self::default()
        }
    }

    /// Append a step
    pub fn then(mut self, step: ScriptStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedClient {
    async fn open(&self, request: &AgentRequest) -> StreamResult<ByteStream> {
        self.requests.lock().push(request.clone());
        if let Some(status) = self.open_error {
            return Err(StreamError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }

        let body = stream::unfold(self.steps.clone().into_iter(), |mut steps| async move {
            loop {
                match steps.next()? {
                    ScriptStep::Chunk(bytes) => return Some((Ok(bytes), steps)),
                    ScriptStep::Pause(duration) => tokio::time::sleep(duration).await,
                    ScriptStep::Fail(reason) => {
                        let err = io::Error::new(io::ErrorKind::ConnectionReset, reason);
                        return Some((Err(StreamError::Io(err)), steps));
                    }
                    ScriptStep::Hang => std::future::pending::<()>().await,
                }
            }
        });
        Ok(body.boxed())
    }
}
