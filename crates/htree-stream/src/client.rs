//! Agent clients
//!
//! [`AgentClient`] is the seam between the run loop and wherever the
//! response body comes from. Opening a run yields a stream of raw byte
//! chunks; framing and JSON decoding happen in the run loop, not here.

use crate::config::AgentConfig;
use crate::error::{StreamError, StreamResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use htree_model::AgentRequest;
use reqwest::Url;
use std::path::PathBuf;

const MAX_ERROR_BODY: usize = 512;

/// Raw response body
pub type ByteStream = BoxStream<'static, StreamResult<Bytes>>;

/// Source of agent response bodies
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Issue a run request and return its streamed body
    async fn open(&self, request: &AgentRequest) -> StreamResult<ByteStream>;
}

/// `POST /run_agent` over HTTP
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    http: reqwest::Client,
    url: Url,
}

impl HttpAgentClient {
    /// Build a client for `config`
    ///
    /// No request timeout is set: a silent stream waits until aborted.
    ///
    /// # Errors
    /// [`StreamError::Config`] for an unusable base URL, or
    /// [`StreamError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> StreamResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("htree/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: config.run_url()?,
        })
    }

    /// Endpoint requests go to
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn open(&self, request: &AgentRequest) -> StreamResult<ByteStream> {
        tracing::info!(url = %self.url, restart = request.is_restart(), "opening agent stream");
        let response = self.http.post(self.url.clone()).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(StreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes_stream().map_err(StreamError::from).boxed())
    }
}

/// Replays a recorded response body from disk
///
/// The whole file is read up front and yielded in `chunk_size` pieces, so
/// chunk boundaries land mid-line the way network reads do.
#[derive(Debug, Clone)]
pub struct FileAgentClient {
    path: PathBuf,
    chunk_size: usize,
}

impl FileAgentClient {
    /// Default replay chunk size in bytes
    pub const DEFAULT_CHUNK_SIZE: usize = 512;

    /// Replay `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// With chunk size, at least one byte
    #[inline]
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait]
impl AgentClient for FileAgentClient {
    async fn open(&self, request: &AgentRequest) -> StreamResult<ByteStream> {
        let body = Bytes::from(tokio::fs::read(&self.path).await?);
        tracing::info!(
            path = %self.path.display(),
            bytes = body.len(),
            problem = %request.problem_statement,
            "replaying recorded stream"
        );

        let chunk_size = self.chunk_size;
        let chunks: Vec<StreamResult<Bytes>> = (0..body.len())
            .step_by(chunk_size)
            .map(|start| Ok(body.slice(start..body.len().min(start + chunk_size))))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}
