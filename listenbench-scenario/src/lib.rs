//! Benchmark runtime for Listenbench
//!
//! Persona scenarios drive the target through per-user agents, every
//! response passes through the [`validation`] pipeline, successes are
//! credited to the [`Scoreboard`], failures land in the [`ErrorLedger`], and
//! the [`LoadController`] ramps parallelism once a second until the error
//! budget runs out. [`Benchmark`] ties the phases together.

pub mod checks;
pub mod controller;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod scenario;
pub mod scoreboard;
pub mod state;
pub mod validation;

pub use controller::{LoadController, TickOutcome};
pub use driver::{BenchReport, Benchmark};
pub use error::{BenchError, ScenarioError};
pub use ledger::{ErrorLedger, ErrorRecord, LedgerSnapshot, Phase};
pub use pool::{CheckedOutUser, UserPool};
pub use scenario::{Fixtures, Pacing, Scenario, ScenarioKind};
pub use scoreboard::Scoreboard;
pub use state::GeneratorState;
pub use validation::{validate, Check, Failure, FailureDetail, Validation};
