//! Load controller
//!
//! Once a second: stop the run when the Load-phase error count reaches the
//! budget; otherwise, if no new errors appeared since the last tick, raise
//! the popular sampling rate. Either way every load worker gets one more
//! unit of parallelism.

use crate::ledger::{ErrorLedger, Phase};
use crate::scoreboard::Scoreboard;
use crate::state::GeneratorState;
use listenbench_core::ErrorKind;
use listenbench_execution::Worker;
use listenbench_logging::{ADMIN, CONTESTANT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Budget exhausted; the scoreboard is closed
    Aborted { errors: u64 },
    ErrorsGrew { delta: u64, total: u64 },
    /// No new errors; the popular rate is now `rate`
    Ramped { rate: i32 },
}

#[derive(Debug)]
pub struct LoadController {
    score: Arc<Scoreboard>,
    errors: Arc<ErrorLedger>,
    state: Arc<GeneratorState>,
    workers: Vec<Arc<Worker>>,
    max_errors: u64,
    last_errors: u64,
}

impl LoadController {
    /// `workers` are the ones that ramp up each tick
    pub fn new(
        score: Arc<Scoreboard>,
        errors: Arc<ErrorLedger>,
        state: Arc<GeneratorState>,
        workers: Vec<Arc<Worker>>,
        max_errors: u64,
    ) -> Self {
        Self {
            score,
            errors,
            state,
            workers,
            max_errors,
            last_errors: 0,
        }
    }

    /// One control step
    pub fn tick(&mut self) -> TickOutcome {
        let total = self.errors.count_in(Phase::Load);
        if total >= self.max_errors {
            info!(target: CONTESTANT, "benchmark aborted (errors={})", total);
            for kind in ErrorKind::all() {
                let count = self.errors.count(*kind);
                if count > 0 {
                    warn!(target: ADMIN, "{}: {} errors", kind, count);
                    for record in self.errors.records(*kind) {
                        warn!(target: ADMIN, "[{}] {} {}", record.phase, record.at, record.message);
                    }
                }
            }
            self.score.close();
            return TickOutcome::Aborted { errors: total };
        }

        let outcome = if total > self.last_errors {
            let delta = total - self.last_errors;
            info!(target: CONTESTANT, "errors grew by {} (now {})", delta, total);
            TickOutcome::ErrorsGrew { delta, total }
        } else {
            let rate = self.state.grow_rate_popular();
            info!(target: CONTESTANT, "users increase");
            info!(target: ADMIN, "popular rate {}", rate);
            TickOutcome::Ramped { rate }
        };
        self.last_errors = total;

        for worker in &self.workers {
            worker.add_parallelism(1);
        }
        outcome
    }

    /// Tick every second until the budget runs out or `token` is cancelled.
    /// Cancels `token` on abort.
    pub async fn run(mut self, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => {
                    if let TickOutcome::Aborted { .. } = self.tick() {
                        token.cancel();
                        return;
                    }
                }
            }
        }
    }
}
