//! Benchmark driver: Prepare, then Load, then scoring

use crate::controller::LoadController;
use crate::error::{BenchError, ScenarioError};
use crate::ledger::{ErrorLedger, LedgerSnapshot, Phase};
use crate::scenario::{Fixtures, Pacing, Scenario, ScenarioKind};
use crate::scoreboard::Scoreboard;
use crate::state::GeneratorState;
use crate::validation::{validate, Check};
use listenbench_config::BenchConfig;
use listenbench_core::ScoreTag;
use listenbench_execution::WorkerOptions;
use listenbench_http::{actions, Agent, AgentConfig};
use listenbench_logging::{ADMIN, CONTESTANT};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Final outcome of a run
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub prepare_passed: bool,
    /// The error budget ran out during Load
    pub aborted: bool,
    pub score: i64,
    pub breakdown: BTreeMap<ScoreTag, i64>,
    pub errors: LedgerSnapshot,
}

#[derive(Debug)]
pub struct Benchmark {
    config: BenchConfig,
    score: Arc<Scoreboard>,
    errors: Arc<ErrorLedger>,
    state: Arc<GeneratorState>,
}

impl Benchmark {
    pub fn new(config: BenchConfig) -> Self {
        let score = Arc::new(Scoreboard::new(config.scoring.clone()));
        let errors = Arc::new(ErrorLedger::new(config.run.error_ledger_capacity));
        let state = Arc::new(GeneratorState::new(config.run.initial_rate_popular));
        Self {
            config,
            score,
            errors,
            state,
        }
    }

    pub fn score(&self) -> &Arc<Scoreboard> {
        &self.score
    }

    pub fn errors(&self) -> &Arc<ErrorLedger> {
        &self.errors
    }

    /// Run every phase the configuration asks for
    pub async fn run(&self, token: CancellationToken) -> BenchReport {
        let scenario = match self.prepare(&token).await {
            Ok(scenario) => scenario,
            Err(e) => {
                error!(target: CONTESTANT, "prepare failed: {}", e);
                self.score.close();
                return self.report(false, false);
            }
        };

        if self.config.run.prepare_only {
            info!(target: CONTESTANT, "prepare only, skipping load");
            self.score.close();
            return self.report(true, false);
        }

        let aborted = match self.load(scenario, &token).await {
            Ok(aborted) => aborted,
            Err(e) => {
                error!(target: CONTESTANT, "load failed: {}", e);
                self.record(&e);
                self.score.close();
                false
            }
        };
        self.report(true, aborted)
    }

    /// Load fixtures, build the scenario context and, unless skipped,
    /// initialize the target and run the integrity check, all within the
    /// prepare timeout
    pub async fn prepare(&self, token: &CancellationToken) -> Result<Arc<Scenario>, BenchError> {
        self.errors.set_phase(Phase::Prepare);
        let timeout = self.config.run.prepare_timeout;
        let prepare_token = token.child_token();

        match tokio::time::timeout(timeout, self.prepare_steps(&prepare_token)).await {
            Ok(result) => result,
            Err(_) => {
                prepare_token.cancel();
                let err = BenchError::PrepareTimeout(timeout);
                self.record(&err);
                Err(err)
            }
        }
    }

    async fn prepare_steps(&self, token: &CancellationToken) -> Result<Arc<Scenario>, BenchError> {
        let fixtures = Fixtures::load(&self.config.data).map_err(|e| self.recorded(e.into()))?;
        info!(
            target: ADMIN,
            "loaded {} users and {} songs",
            fixtures.users.len(),
            fixtures.songs.len()
        );

        let agent_config =
            AgentConfig::new(&self.config.target, &self.config.http).map_err(|e| self.recorded(e.into()))?;
        let scenario = Arc::new(Scenario::new(
            agent_config.clone(),
            fixtures,
            Arc::clone(&self.score),
            Arc::clone(&self.errors),
            Arc::clone(&self.state),
        )
        .with_pacing(Pacing::from(&self.config.run)));

        if self.config.run.skip_prepare {
            info!(target: CONTESTANT, "skipping initialize and integrity check");
            scenario.set_debug(self.config.run.debug);
            return Ok(scenario);
        }

        let agent = Agent::new(agent_config.with_timeout(self.config.target.initialize_timeout))
            .map_err(|e| self.recorded(e.into()))?;
        info!(target: CONTESTANT, "initializing target");
        let res = actions::initialize(&agent, token).await;
        let validation = validate(
            "POST /initialize",
            &self.errors,
            &res,
            [Check::status(&[200]), Check::success_base()],
        );
        if validation.is_cancelled() {
            return Err(BenchError::Cancelled);
        }
        validation.into_result().map_err(BenchError::Initialize)?;

        info!(target: CONTESTANT, "integrity check started");
        scenario.set_debug(true);
        let result = scenario.run(ScenarioKind::Integrity, token).await;
        scenario.set_debug(self.config.run.debug);
        match result {
            Ok(()) => {
                info!(target: CONTESTANT, "integrity check passed");
                Ok(scenario)
            }
            Err(ScenarioError::Cancelled) => Err(BenchError::Cancelled),
            Err(e) => Err(BenchError::IntegrityCheck(e)),
        }
    }

    /// Spawn every persona worker and the controller, and stop them all when
    /// the load duration elapses or the controller aborts. Returns whether
    /// the run was aborted.
    pub async fn load(&self, scenario: Arc<Scenario>, token: &CancellationToken) -> Result<bool, BenchError> {
        self.errors.set_phase(Phase::Load);
        let run = &self.config.run;

        let normal = Arc::new(scenario.worker(ScenarioKind::Normal, WorkerOptions::unbounded(1))?);
        let favorite = Arc::new(scenario.worker(ScenarioKind::FavoriteBomb, WorkerOptions::unbounded(1))?);
        let anonymous = Arc::new(scenario.worker(ScenarioKind::Anonymous, WorkerOptions::unbounded(1))?);
        let banned = Arc::new(scenario.worker(
            ScenarioKind::Banned,
            WorkerOptions::bounded(1, run.banned_max_parallelism),
        )?);
        let admin = Arc::new(scenario.worker(ScenarioKind::Admin, WorkerOptions::bounded(1, 1))?);

        let controller = LoadController::new(
            Arc::clone(&self.score),
            Arc::clone(&self.errors),
            Arc::clone(&self.state),
            vec![Arc::clone(&normal), Arc::clone(&favorite), Arc::clone(&anonymous)],
            run.max_errors,
        );

        let load_token = token.child_token();
        let mut tasks = JoinSet::new();
        for worker in [normal, favorite, anonymous, banned, admin] {
            let token = load_token.clone();
            tasks.spawn(async move { worker.process(token).await });
        }
        tasks.spawn(controller.run(load_token.clone()));
        info!(target: CONTESTANT, "load started");

        tokio::select! {
            _ = tokio::time::sleep(run.load_duration) => {}
            _ = load_token.cancelled() => {}
        }
        let aborted = self.score.is_closed();
        load_token.cancel();

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("load task failed: {}", e);
            }
        }
        self.score.close();
        info!(target: CONTESTANT, "load finished");
        Ok(aborted)
    }

    fn record(&self, err: &BenchError) {
        self.errors.record(err.kind(), err.to_string());
    }

    fn recorded(&self, err: BenchError) -> BenchError {
        self.record(&err);
        err
    }

    fn report(&self, prepare_passed: bool, aborted: bool) -> BenchReport {
        let breakdown = self.score.snapshot();
        let errors = self.errors.snapshot();
        for (tag, count) in breakdown.iter().filter(|(_, count)| **count > 0) {
            info!(target: ADMIN, "{}: {}", tag, count);
        }
        for (kind, count) in &errors.by_kind {
            info!(target: ADMIN, "errors {}: {}", kind, count);
        }

        BenchReport {
            prepare_passed,
            aborted,
            score: if prepare_passed { self.score.total() } else { 0 },
            breakdown,
            errors,
        }
    }
}
