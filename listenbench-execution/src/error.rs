//! Error types for workers

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Worker {name}: initial parallelism {requested} exceeds maximum {max}")]
    ParallelismAboveMax {
        name: String,
        requested: usize,
        max: usize,
    },

    #[error("Worker {name}: maximum parallelism must be greater than 0")]
    ZeroMaxParallelism { name: String },
}
