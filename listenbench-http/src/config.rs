//! Agent configuration

use crate::errors::AgentError;
use listenbench_config::{HttpConfig, TargetConfig};
use std::time::Duration;
use url::Url;

/// Everything needed to build an [`Agent`](crate::Agent)
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
}

impl AgentConfig {
    pub fn new(target: &TargetConfig, http: &HttpConfig) -> Result<Self, AgentError> {
        let base_url = Url::parse(&target.url)
            .map_err(|e| AgentError::InvalidUrl(format!("{}: {}", target.url, e)))?;

        Ok(Self {
            base_url,
            timeout: http.timeout,
            connect_timeout: http.connect_timeout,
            user_agent: http.user_agent.clone(),
            max_idle_per_host: http.max_idle_per_host,
            idle_timeout: http.idle_timeout,
        })
    }

    /// Same settings, different request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a request path against the base URL
    pub fn url_for(&self, path: &str) -> Result<Url, AgentError> {
        self.base_url
            .join(path)
            .map_err(|e| AgentError::InvalidUrl(format!("{}: {}", path, e)))
    }
}
