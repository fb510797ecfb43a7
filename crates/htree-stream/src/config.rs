//! Agent endpoint configuration

use crate::error::{StreamError, StreamResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Where the agent backend lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Scheme, host and port
    pub base_url: String,
    /// Path of the streaming run endpoint
    pub run_path: String,
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With run path
    #[inline]
    #[must_use]
    pub fn with_run_path(mut self, run_path: impl Into<String>) -> Self {
        self.run_path = run_path.into();
        self
    }

    /// Full run endpoint URL
    ///
    /// The run path is resolved below the base URL, keeping any path prefix
    /// the base already has.
    ///
    /// # Errors
    /// [`StreamError::Config`] when the base URL does not parse or is not
    /// http(s).
    pub fn run_url(&self) -> StreamResult<Url> {
        let invalid = |reason: String| StreamError::Config(format!("invalid base url '{}': {reason}", self.base_url));

        let mut base = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(self.run_path.trim_start_matches('/'))
            .map_err(|err| invalid(err.to_string()))
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            run_path: "/run_agent".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_agent() {
        assert_eq!(AgentConfig::new().run_url().unwrap().as_str(), "http://localhost:8000/run_agent");
    }

    #[test]
    fn slashes_are_normalized() {
        let config = AgentConfig::new()
            .with_base_url("https://agent.internal/")
            .with_run_path("api/run");
        assert_eq!(config.run_url().unwrap().as_str(), "https://agent.internal/api/run");
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let config = AgentConfig::new().with_base_url("http://gateway:9000/agents/v1");
        assert_eq!(config.run_url().unwrap().as_str(), "http://gateway:9000/agents/v1/run_agent");
    }

    #[test]
    fn non_http_base_is_rejected() {
        for base in ["localhost:8000", "ftp://agent.internal", "not a url"] {
            let config = AgentConfig::new().with_base_url(base);
            assert!(matches!(config.run_url(), Err(StreamError::Config(_))), "{base}");
        }
    }
}
