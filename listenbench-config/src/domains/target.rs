//! Target web service configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the system under test lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL, e.g. `http://localhost`
    #[serde(default = "default_url")]
    pub url: String,

    /// Timeout for the `POST /initialize` call
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_initialize_timeout"
    )]
    pub initialize_timeout: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            initialize_timeout: default_initialize_timeout(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.url, "url", self.domain_name())?;
        validate_positive(
            self.initialize_timeout.as_secs(),
            "initialize_timeout",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_url() -> String {
    "http://localhost".to_string()
}

fn default_initialize_timeout() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults() {
        let config = TargetConfig::default();
        assert_eq!(config.url, "http://localhost");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_rejects_bad_url() {
        let config = TargetConfig {
            url: "localhost:8080".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
