use anyhow::Result;
use listenbench_config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Build the filter for the configured level.
///
/// `RUST_LOG` wins when set and parseable. In debug mode the level is raised
/// to at least `debug`.
pub fn build_env_filter(level: LogLevel, debug: bool) -> EnvFilter {
    let level = match (debug, level) {
        (true, LogLevel::Error | LogLevel::Warn | LogLevel::Info) => LogLevel::Debug,
        (_, level) => level,
    };

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber. Output goes to stderr.
pub fn init_logging(config: &LoggingConfig, debug: bool) -> Result<()> {
    let env_filter = build_env_filter(config.level, debug);

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    // try_init so a second call (tests, embedding) does not panic
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_raises_level() {
        std::env::remove_var("RUST_LOG");
        let filter = build_env_filter(LogLevel::Info, true);
        assert_eq!(filter.to_string(), "debug");

        let filter = build_env_filter(LogLevel::Trace, true);
        assert_eq!(filter.to_string(), "trace");

        let filter = build_env_filter(LogLevel::Warn, false);
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config, false).is_ok());
        assert!(init_logging(&config, true).is_ok());
    }
}
