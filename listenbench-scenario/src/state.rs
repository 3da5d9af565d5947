//! Mutable state shared by all scenarios during a run

use chrono::{DateTime, Utc};
use listenbench_config::domains::run::{MAX_RATE_POPULAR, MIN_RATE_POPULAR};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::atomic::{AtomicI32, Ordering};

/// Growth factor applied to the popular sampling rate on error-free ticks
const RATE_GROWTH: f32 = 1.41422;

#[derive(Debug)]
pub struct GeneratorState {
    rate_popular: AtomicI32,
    last_public_created_at: RwLock<Option<DateTime<Utc>>>,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new(10)
    }
}

impl GeneratorState {
    /// The rate is clamped to `MIN_RATE_POPULAR..=MAX_RATE_POPULAR`
    pub fn new(initial_rate_popular: i32) -> Self {
        Self {
            rate_popular: AtomicI32::new(
                initial_rate_popular.clamp(MIN_RATE_POPULAR, MAX_RATE_POPULAR),
            ),
            last_public_created_at: RwLock::new(None),
        }
    }

    /// Percentage of iterations that also fetch the popular list
    pub fn rate_popular(&self) -> i32 {
        self.rate_popular.load(Ordering::Acquire)
    }

    /// Multiply the rate by ~√2, truncating and capping at the maximum.
    /// Returns the new rate.
    pub fn grow_rate_popular(&self) -> i32 {
        let previous = self
            .rate_popular
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |rate| {
                Some(((rate as f32 * RATE_GROWTH) as i32).min(MAX_RATE_POPULAR))
            })
            .unwrap_or_else(|rate| rate);
        ((previous as f32 * RATE_GROWTH) as i32).min(MAX_RATE_POPULAR)
    }

    /// Roll against the current rate
    pub fn should_fetch_popular(&self) -> bool {
        rand::thread_rng().gen_range(0..MAX_RATE_POPULAR) < self.rate_popular()
    }

    /// Creation time of the newest playlist known to be public
    pub fn last_public_created_at(&self) -> Option<DateTime<Utc>> {
        *self.last_public_created_at.read()
    }

    /// Only ever moves forward. Returns whether the value changed.
    pub fn observe_public_created_at(&self, created_at: DateTime<Utc>) -> bool {
        let mut last = self.last_public_created_at.write();
        match *last {
            Some(current) if current >= created_at => false,
            _ => {
                *last = Some(created_at);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_rate_growth_sequence() {
        let state = GeneratorState::new(10);
        let rates: Vec<i32> = (0..4).map(|_| state.grow_rate_popular()).collect();
        assert_eq!(rates, vec![14, 19, 26, 36]);
        assert_eq!(state.rate_popular(), 36);
    }

    #[test]
    fn test_rate_is_capped() {
        let state = GeneratorState::new(80);
        assert_eq!(state.grow_rate_popular(), 100);
        assert_eq!(state.grow_rate_popular(), 100);
    }

    #[test]
    fn test_initial_rate_is_clamped() {
        let state = GeneratorState::new(0);
        assert_eq!(state.rate_popular(), MIN_RATE_POPULAR);
        // a zero rate would never grow
        assert_eq!(state.grow_rate_popular(), 14);
        assert_eq!(GeneratorState::new(250).rate_popular(), MAX_RATE_POPULAR);
    }

    #[test]
    fn test_full_rate_always_fetches() {
        let state = GeneratorState::new(MAX_RATE_POPULAR);
        assert!((0..200).all(|_| state.should_fetch_popular()));
    }

    #[test]
    fn test_last_public_only_moves_forward() {
        let state = GeneratorState::default();
        let now = Utc::now();
        assert!(state.observe_public_created_at(now));
        assert!(!state.observe_public_created_at(now - Duration::seconds(5)));
        assert_eq!(state.last_public_created_at(), Some(now));
        assert!(state.observe_public_created_at(now + Duration::seconds(1)));
    }
}
