//! File configuration
//!
//! ```toml
//! [agent]
//! base_url = "http://localhost:8000"
//! run_path = "/run_agent"
//!
//! [pacing]
//! arrival_interval_ms = 250
//! frame_interval_ms = 16
//!
//! [layout]
//! node_width = 320.0
//! node_height = 180.0
//! rank_sep = 100.0
//! node_sep = 80.0
//! rank_dir = "TB"
//! ```
//!
//! Every section and key is optional.

use anyhow::Context;
use htree_engine::{LayoutConfig, PacingConfig};
use htree_stream::AgentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "htree.toml";

/// Everything the binary can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Backend location
    pub agent: AgentConfig,
    /// Arrival and frame pacing
    pub pacing: PacingConfig,
    /// Layout parameters
    pub layout: LayoutConfig,
}

impl CliConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Invalid TOML or mistyped values.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load `explicit`, else [`DEFAULT_CONFIG_FILE`] if present, else defaults
    ///
    /// # Errors
    /// An explicit path that cannot be read, or any file that fails to parse.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    tracing::debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// With the agent base URL replaced
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.agent.base_url = url.to_string();
        }
        self
    }
}
