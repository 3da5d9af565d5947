//! CLI argument parsing definitions

use anyhow::{Context, Result};
use clap::Parser;
use listenbench_config::{BenchConfig, ConfigLoader, LogLevel};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(author, version, about = "Load generator and validator for the playlist service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the target, e.g. http://localhost
    #[arg(long, value_name = "URL")]
    pub target_url: Option<String>,

    /// Directory holding users.json and songs.json
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Stop after initialize and the integrity check
    #[arg(long, conflicts_with = "skip_prepare")]
    pub prepare_only: bool,

    /// Skip initialize and the integrity check
    #[arg(long)]
    pub skip_prepare: bool,

    /// Verbose logging and per-scenario timings
    #[arg(long)]
    pub debug: bool,

    /// Load-phase error budget
    #[arg(long, value_name = "N")]
    pub max_errors: Option<u64>,

    /// Load phase length in seconds
    #[arg(long, value_name = "SECS")]
    pub load_duration: Option<u64>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_sample_config: bool,
}

impl Cli {
    /// Configuration file (or defaults) plus environment, then flags on top
    pub fn load_config(&self) -> Result<BenchConfig> {
        let mut config = ConfigLoader::new()
            .load(self.config.as_ref())
            .context("failed to load configuration")?;
        self.apply(&mut config)?;
        config
            .validate_all()
            .context("invalid configuration after command line overrides")?;
        Ok(config)
    }

    fn apply(&self, config: &mut BenchConfig) -> Result<()> {
        if let Some(url) = &self.target_url {
            config.target.url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data.dir = dir.clone();
        }
        if self.prepare_only {
            config.run.prepare_only = true;
        }
        if self.skip_prepare {
            config.run.skip_prepare = true;
        }
        if self.debug {
            config.run.debug = true;
        }
        if let Some(max_errors) = self.max_errors {
            config.run.max_errors = max_errors;
        }
        if let Some(secs) = self.load_duration {
            config.run.load_duration = Duration::from_secs(secs);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level
                .parse::<LogLevel>()
                .map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}
