mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use listenbench_config::BenchConfig;
use listenbench_logging::{init_logging, CONTESTANT};
use listenbench_scenario::Benchmark;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", BenchConfig::generate_sample());
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.load_config()?;
    init_logging(&config.logging, config.run.debug)?;
    info!(target: CONTESTANT, "benchmarking {}", config.target.url);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received shutdown signal");
            shutdown.cancel();
        }
    });

    let report = Benchmark::new(config).run(token).await;

    // the only line written to stdout
    println!("SCORE: {}", report.score);

    if report.prepare_passed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
