//! Tag-keyed success counters
//!
//! Counters are incremented from every scenario task concurrently. Once the
//! board is closed further increments are dropped, so the total reported at
//! the end of the run cannot move after the controller or the driver has
//! decided the run is over.

use listenbench_config::ScoringConfig;
use listenbench_core::ScoreTag;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

#[derive(Debug)]
pub struct Scoreboard {
    counts: HashMap<ScoreTag, AtomicI64>,
    weights: ScoringConfig,
    closed: AtomicBool,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl Scoreboard {
    pub fn new(weights: ScoringConfig) -> Self {
        let counts = ScoreTag::all()
            .iter()
            .map(|tag| (*tag, AtomicI64::new(0)))
            .collect();
        Self {
            counts,
            weights,
            closed: AtomicBool::new(false),
        }
    }

    /// Credit one success. Returns false once the board is closed.
    pub fn add(&self, tag: ScoreTag) -> bool {
        if self.is_closed() {
            return false;
        }
        if let Some(counter) = self.counts.get(&tag) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        true
    }

    pub fn count(&self, tag: ScoreTag) -> i64 {
        self.counts
            .get(&tag)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Per-tag counts, in tag order
    pub fn snapshot(&self) -> BTreeMap<ScoreTag, i64> {
        ScoreTag::all()
            .iter()
            .map(|tag| (*tag, self.count(*tag)))
            .collect()
    }

    /// Weighted sum of all tags, never below zero
    pub fn total(&self) -> i64 {
        ScoreTag::all()
            .iter()
            .map(|tag| self.count(*tag).saturating_mul(self.weights.weight(*tag)))
            .fold(0i64, i64::saturating_add)
            .max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_and_total() {
        let board = Scoreboard::default();
        board.add(ScoreTag::Login);
        board.add(ScoreTag::Login);
        board.add(ScoreTag::GetPlaylist);
        assert_eq!(board.count(ScoreTag::Login), 2);
        assert_eq!(board.total(), 3);
    }

    #[test]
    fn test_weights_apply() {
        let mut weights = ScoringConfig::default();
        weights.weights.insert(ScoreTag::AddPlaylist, 10);
        weights.weights.insert(ScoreTag::GetRoot, 0);
        let board = Scoreboard::new(weights);
        board.add(ScoreTag::AddPlaylist);
        board.add(ScoreTag::GetRoot);
        board.add(ScoreTag::Signup);
        assert_eq!(board.total(), 11);
    }

    #[test]
    fn test_closed_board_ignores_adds() {
        let board = Scoreboard::default();
        board.add(ScoreTag::Login);
        board.close();
        assert!(!board.add(ScoreTag::Login));
        assert_eq!(board.total(), 1);
    }

    #[test]
    fn test_snapshot_lists_every_tag() {
        let board = Scoreboard::default();
        board.add(ScoreTag::AdminBan);
        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), ScoreTag::all().len());
        assert_eq!(snapshot[&ScoreTag::AdminBan], 1);
        assert_eq!(snapshot[&ScoreTag::Logout], 0);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let board = Arc::new(Scoreboard::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let board = Arc::clone(&board);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        board.add(ScoreTag::GetRecentPlaylists);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(board.count(ScoreTag::GetRecentPlaylists), 8000);
    }
}
