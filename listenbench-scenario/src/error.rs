//! Error types for scenarios and the benchmark driver

use crate::validation::Validation;
use listenbench_core::{CoreError, ErrorKind};
use listenbench_execution::WorkerError;
use listenbench_http::AgentError;
use std::time::Duration;
use thiserror::Error;

/// Why a scenario invocation stopped early.
///
/// Failures are already in the ledger by the time one of these is returned;
/// callers only decide whether to keep going.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{0}")]
    Validation(Validation),

    #[error("agent unavailable: {0}")]
    Agent(#[source] AgentError),

    #[error("scenario cancelled")]
    Cancelled,
}

impl ScenarioError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScenarioError::Cancelled)
    }
}

/// Errors that end a benchmark phase
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("failed to load fixtures: {0}")]
    Fixture(#[from] CoreError),

    #[error("failed to build agent: {0}")]
    Agent(#[from] AgentError),

    #[error("failed to create worker: {0}")]
    Worker(#[from] WorkerError),

    #[error("initialize failed: {0}")]
    Initialize(Validation),

    #[error("integrity check failed: {0}")]
    IntegrityCheck(#[source] ScenarioError),

    #[error("prepare did not finish within {0:?}")]
    PrepareTimeout(Duration),

    #[error("benchmark cancelled")]
    Cancelled,
}

impl BenchError {
    /// Taxonomy bucket this error is aggregated under
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::Fixture(e) => e.kind(),
            BenchError::Agent(e) => e.kind(),
            BenchError::IntegrityCheck(ScenarioError::Agent(e)) => e.kind(),
            _ => ErrorKind::Request,
        }
    }
}
