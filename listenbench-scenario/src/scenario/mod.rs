//! Persona scenarios
//!
//! [`Scenario`] owns everything the personas share: the agent settings, the
//! fixture pools, the scoreboard, the error ledger and the generator state.
//! Each persona is one async function; [`ScenarioKind`] selects it and
//! [`Scenario::worker`] wraps it in a [`Worker`].

mod admin;
mod anonymous;
mod banned;
mod favorite;
mod integrity;
mod normal;

use crate::error::ScenarioError;
use crate::ledger::ErrorLedger;
use crate::pool::UserPool;
use crate::scoreboard::Scoreboard;
use crate::state::GeneratorState;
use crate::validation::{self, Check};
use listenbench_config::{DataConfig, RunConfig};
use listenbench_core::{load_json_file, CoreError, ScoreTag, Song, UserProfile};
use listenbench_execution::{Worker, WorkerError, WorkerOptions};
use listenbench_http::{Agent, AgentConfig, AgentError, AgentResponse, User};
use listenbench_logging::ADMIN;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    Normal,
    FavoriteBomb,
    Anonymous,
    Banned,
    Admin,
    Integrity,
}

impl ScenarioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::Normal => "normal",
            ScenarioKind::FavoriteBomb => "favorite-bomb",
            ScenarioKind::Anonymous => "anonymous",
            ScenarioKind::Banned => "banned",
            ScenarioKind::Admin => "admin",
            ScenarioKind::Integrity => "integrity",
        }
    }

    fn stagger(&self, pacing: &Pacing) -> Option<Duration> {
        match self {
            ScenarioKind::Banned | ScenarioKind::Admin => Some(pacing.stagger),
            _ => None,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed waits inside and between scenario iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Before each banned or admin iteration
    pub stagger: Duration,
    /// Before a ban or unban is checked
    pub ban_grace: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            stagger: Duration::from_secs(3),
            ban_grace: Duration::from_secs(3),
        }
    }
}

impl From<&RunConfig> for Pacing {
    fn from(run: &RunConfig) -> Self {
        Self {
            stagger: run.stagger,
            ban_grace: run.ban_grace,
        }
    }
}

/// Fixture data for one run
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<UserProfile>,
    pub songs: Vec<Song>,
}

impl Fixtures {
    pub fn load(data: &DataConfig) -> Result<Self, CoreError> {
        let users = load_json_file(data.users_path())?;
        let songs = load_json_file(data.songs_path())?;
        Ok(Self { users, songs })
    }
}

pub struct Scenario {
    agent_config: AgentConfig,
    score: Arc<Scoreboard>,
    errors: Arc<ErrorLedger>,
    state: Arc<GeneratorState>,
    songs: Vec<Song>,
    normal_users: Arc<UserPool>,
    heavy_users: Arc<UserPool>,
    banned_users: Arc<UserPool>,
    admin: Arc<User>,
    pacing: Pacing,
    debug: AtomicBool,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("base_url", &self.agent_config.base_url.as_str())
            .field("songs", &self.songs.len())
            .field("normal_users", &self.normal_users.len())
            .field("heavy_users", &self.heavy_users.len())
            .field("banned_users", &self.banned_users.len())
            .finish()
    }
}

impl Scenario {
    /// Partition fixture users into banned, heavy and normal pools
    pub fn new(
        agent_config: AgentConfig,
        fixtures: Fixtures,
        score: Arc<Scoreboard>,
        errors: Arc<ErrorLedger>,
        state: Arc<GeneratorState>,
    ) -> Self {
        let mut normal = Vec::new();
        let mut heavy = Vec::new();
        let mut banned = Vec::new();
        for profile in fixtures.users {
            let user = Arc::new(User::new(profile));
            if user.profile.is_ban {
                banned.push(user);
            } else if user.profile.is_heavy {
                heavy.push(user);
            } else {
                normal.push(user);
            }
        }
        debug!(
            "user pools: {} normal, {} heavy, {} banned",
            normal.len(),
            heavy.len(),
            banned.len()
        );

        Self {
            agent_config,
            score,
            errors,
            state,
            songs: fixtures.songs,
            normal_users: UserPool::new("normal", normal),
            heavy_users: UserPool::new("heavy", heavy),
            banned_users: UserPool::new("banned", banned),
            admin: Arc::new(User::new(UserProfile::admin())),
            pacing: Pacing::default(),
            debug: AtomicBool::new(false),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn score(&self) -> &Arc<Scoreboard> {
        &self.score
    }

    pub fn errors(&self) -> &Arc<ErrorLedger> {
        &self.errors
    }

    pub fn state(&self) -> &Arc<GeneratorState> {
        &self.state
    }

    pub fn normal_users(&self) -> &Arc<UserPool> {
        &self.normal_users
    }

    pub fn heavy_users(&self) -> &Arc<UserPool> {
        &self.heavy_users
    }

    pub fn banned_users(&self) -> &Arc<UserPool> {
        &self.banned_users
    }

    /// Report the duration of every scenario run
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Run one iteration of `kind`
    pub async fn run(&self, kind: ScenarioKind, token: &CancellationToken) -> Result<(), ScenarioError> {
        let _timer = TimeReport::start(kind, self.debug.load(Ordering::Relaxed));
        let result = match kind {
            ScenarioKind::Normal => normal::run(self, token).await,
            ScenarioKind::FavoriteBomb => favorite::run(self, token).await,
            ScenarioKind::Anonymous => anonymous::run(self, token).await,
            ScenarioKind::Banned => banned::run(self, token).await,
            ScenarioKind::Admin => admin::run(self, token).await,
            ScenarioKind::Integrity => integrity::run(self, token).await,
        };
        if let Err(e) = &result {
            if !e.is_cancelled() {
                debug!("{} scenario stopped: {}", kind, e);
            }
        }
        result
    }

    /// Worker that runs `kind` in a loop, waiting first when the persona
    /// is staggered
    pub fn worker(self: &Arc<Self>, kind: ScenarioKind, options: WorkerOptions) -> Result<Worker, WorkerError> {
        let scenario = Arc::clone(self);
        Worker::new(kind.as_str(), options, move |token: CancellationToken, _seq: u64| {
            let scenario = Arc::clone(&scenario);
            async move {
                if let Some(delay) = kind.stagger(&scenario.pacing) {
                    if sleep(&token, delay).await.is_err() {
                        return;
                    }
                }
                // failures are already in the ledger
                let _ = scenario.run(kind, &token).await;
            }
        })
    }

    fn validate<'a>(
        &self,
        label: &str,
        response: &Result<AgentResponse, AgentError>,
        checks: impl IntoIterator<Item = Check<'a>>,
    ) -> Result<(), ScenarioError> {
        let validation = validation::validate(label, &self.errors, response, checks);
        if validation.is_cancelled() {
            return Err(ScenarioError::Cancelled);
        }
        validation.into_result().map_err(ScenarioError::Validation)
    }

    fn credit(&self, tag: ScoreTag) {
        self.score.add(tag);
    }

    fn agent_error(&self, err: AgentError) -> ScenarioError {
        self.errors.record(err.kind(), err.to_string());
        ScenarioError::Agent(err)
    }

    /// The user's long-lived agent
    fn agent_for(&self, user: &User) -> Result<Arc<Agent>, ScenarioError> {
        user.agent(&self.agent_config).map_err(|e| self.agent_error(e))
    }

    /// An agent with an empty cookie jar
    fn fresh_agent(&self) -> Result<Agent, ScenarioError> {
        Agent::new(self.agent_config.clone()).map_err(|e| self.agent_error(e))
    }
}

/// Cancellable sleep
async fn sleep(token: &CancellationToken, duration: Duration) -> Result<(), ScenarioError> {
    tokio::select! {
        _ = token.cancelled() => Err(ScenarioError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

struct TimeReport {
    kind: ScenarioKind,
    started: Instant,
    enabled: bool,
}

impl TimeReport {
    fn start(kind: ScenarioKind, enabled: bool) -> Self {
        Self {
            kind,
            started: Instant::now(),
            enabled,
        }
    }
}

impl Drop for TimeReport {
    fn drop(&mut self) {
        if self.enabled {
            info!(target: ADMIN, "{} scenario took {:?}", self.kind, self.started.elapsed());
        }
    }
}
