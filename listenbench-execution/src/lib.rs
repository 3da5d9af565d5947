//! Scenario execution for Listenbench
//!
//! A [`Worker`] runs one closure over and over under a cancellation token,
//! with a parallelism level that can be changed while it runs.

pub mod error;
pub mod worker;

pub use error::WorkerError;
pub use worker::{LoopMode, Worker, WorkerOptions};
