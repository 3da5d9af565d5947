//! Logging for Listenbench
//!
//! Everything goes through `tracing`. Two channels are distinguished by
//! target: [`ADMIN`] carries operator detail (breakdowns, timings, rate
//! changes), [`CONTESTANT`] carries the short messages meant for the team
//! being benchmarked. Both are written to stderr so stdout only ever holds
//! the final score line.

pub mod init;

pub use init::{build_env_filter, init_logging};

/// Target for operator-facing events
pub const ADMIN: &str = "admin";

/// Target for contestant-facing events
pub const CONTESTANT: &str = "contestant";
