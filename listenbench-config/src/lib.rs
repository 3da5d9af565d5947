//! Domain-driven configuration for Listenbench
//!
//! Configuration is split by functional domain (target, http, data, run,
//! scoring, logging). Every domain has defaults, is validated on load, and
//! can be read from a YAML file with a small set of environment overrides.

pub mod error;
pub mod loader;
pub mod validation;

pub mod domains;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

pub use domains::{
    data::DataConfig,
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    run::RunConfig,
    scoring::ScoringConfig,
    target::TargetConfig,
    BenchConfig,
};

pub use domains::utils::serde_duration;
