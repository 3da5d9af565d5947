//! Domain-specific configuration modules

pub mod data;
pub mod http;
pub mod logging;
pub mod run;
pub mod scoring;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Listenbench configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BenchConfig {
    /// Target web service
    pub target: target::TargetConfig,

    /// HTTP agent configuration
    pub http: http::HttpConfig,

    /// Fixture locations
    pub data: data::DataConfig,

    /// Benchmark run parameters
    pub run: run::RunConfig,

    /// Score weights
    pub scoring: scoring::ScoringConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,
}

impl BenchConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.data.validate()?;
        self.run.validate()?;
        self.scoring.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = BenchConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
