//! Benchmark run parameters

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds of the popular-list sampling rate, in percent
pub const MIN_RATE_POPULAR: i32 = 10;
pub const MAX_RATE_POPULAR: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after Prepare
    pub prepare_only: bool,

    /// Skip `/initialize` and the validation pass
    pub skip_prepare: bool,

    /// Verbose logging and per-scenario timing reports
    pub debug: bool,

    /// Load-phase error budget; reaching it aborts the run
    #[serde(default = "default_max_errors")]
    pub max_errors: u64,

    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_prepare_timeout"
    )]
    pub prepare_timeout: Duration,

    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_load_duration"
    )]
    pub load_duration: Duration,

    /// Starting percentage for popular-list sampling
    #[serde(default = "default_initial_rate_popular")]
    pub initial_rate_popular: i32,

    /// Descriptors kept per error kind; counts are never capped
    #[serde(default = "default_error_ledger_capacity")]
    pub error_ledger_capacity: usize,

    #[serde(default = "default_banned_max_parallelism")]
    pub banned_max_parallelism: usize,

    /// Wait before each banned or admin iteration
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_pacing"
    )]
    pub stagger: Duration,

    /// Time the target gets before a ban or unban is checked
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_pacing"
    )]
    pub ban_grace: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            prepare_only: false,
            skip_prepare: false,
            debug: false,
            max_errors: default_max_errors(),
            prepare_timeout: default_prepare_timeout(),
            load_duration: default_load_duration(),
            initial_rate_popular: default_initial_rate_popular(),
            error_ledger_capacity: default_error_ledger_capacity(),
            banned_max_parallelism: default_banned_max_parallelism(),
            stagger: default_pacing(),
            ban_grace: default_pacing(),
        }
    }
}

impl Validatable for RunConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.prepare_only && self.skip_prepare {
            return Err(self.validation_error("prepare_only and skip_prepare are mutually exclusive"));
        }

        validate_positive(self.max_errors, "max_errors", self.domain_name())?;
        validate_positive(
            self.prepare_timeout.as_secs(),
            "prepare_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.load_duration.as_secs(),
            "load_duration",
            self.domain_name(),
        )?;
        validate_positive(
            self.banned_max_parallelism,
            "banned_max_parallelism",
            self.domain_name(),
        )?;

        validate_positive(self.stagger.as_secs(), "stagger", self.domain_name())?;
        validate_positive(self.ban_grace.as_secs(), "ban_grace", self.domain_name())?;

        if !(MIN_RATE_POPULAR..=MAX_RATE_POPULAR).contains(&self.initial_rate_popular) {
            return Err(self.validation_error(format!(
                "initial_rate_popular must be within {}..={}, got {}",
                MIN_RATE_POPULAR, MAX_RATE_POPULAR, self.initial_rate_popular
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "run"
    }
}

fn default_max_errors() -> u64 {
    30
}

fn default_prepare_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_load_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_initial_rate_popular() -> i32 {
    10
}

fn default_error_ledger_capacity() -> usize {
    100
}

fn default_banned_max_parallelism() -> usize {
    10
}

fn default_pacing() -> Duration {
    Duration::from_secs(3)
}
