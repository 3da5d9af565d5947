//! Benchmark user with a lazily allocated agent

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::errors::AgentError;
use listenbench_core::UserProfile;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
pub struct User {
    pub profile: UserProfile,
    agent: Mutex<Option<Arc<Agent>>>,
}

impl User {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            agent: Mutex::new(None),
        }
    }

    pub fn account(&self) -> &str {
        &self.profile.account
    }

    /// The user's agent, created on first call.
    ///
    /// Concurrent first calls serialize on the mutex; every caller gets the
    /// same instance.
    pub fn agent(&self, config: &AgentConfig) -> Result<Arc<Agent>, AgentError> {
        let mut slot = self.agent.lock();
        if let Some(agent) = slot.as_ref() {
            return Ok(Arc::clone(agent));
        }
        let agent = Arc::new(Agent::new(config.clone())?);
        *slot = Some(Arc::clone(&agent));
        Ok(agent)
    }

    /// Close idle connections of the agent, if one was ever allocated
    pub fn release_connections(&self) {
        if let Some(agent) = self.agent.lock().as_ref() {
            agent.close_idle_connections();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listenbench_config::{HttpConfig, TargetConfig};

    fn config() -> AgentConfig {
        AgentConfig::new(&TargetConfig::default(), &HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_agent_is_allocated_once() {
        let user = User::new(UserProfile::new("a", "b"));
        let first = user.agent(&config()).unwrap();
        let second = user.agent(&config()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_allocation_yields_one_agent() {
        let user = Arc::new(User::new(UserProfile::new("a", "b")));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let user = Arc::clone(&user);
                std::thread::spawn(move || user.agent(&config()).unwrap())
            })
            .collect();
        let agents: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(agents.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_release_without_agent_is_noop() {
        let user = User::new(UserProfile::new("a", "b"));
        user.release_connections();
    }
}
