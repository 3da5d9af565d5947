//! Error ledger
//!
//! Counts every recorded failure by kind and by the phase it happened in,
//! and keeps a bounded number of descriptors per kind for the admin log.
//! The controller only ever looks at Load-phase counts.

use chrono::{DateTime, Utc};
use listenbench_core::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Load,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Load => "load",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Phase::Load,
            _ => Phase::Prepare,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Phase::Prepare => 0,
            Phase::Load => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded failure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub phase: Phase,
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub total: u64,
    pub by_kind: BTreeMap<ErrorKind, u64>,
    pub by_phase: BTreeMap<Phase, u64>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    total: u64,
    by_kind: BTreeMap<ErrorKind, u64>,
    by_phase: BTreeMap<Phase, u64>,
    records: BTreeMap<ErrorKind, Vec<ErrorRecord>>,
}

#[derive(Debug)]
pub struct ErrorLedger {
    capacity: usize,
    phase: AtomicU8,
    inner: Mutex<LedgerInner>,
}

impl Default for ErrorLedger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ErrorLedger {
    /// `capacity` bounds the descriptors kept per kind
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            phase: AtomicU8::new(Phase::Prepare.as_u8()),
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Failures recorded from now on are attributed to `phase`
    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    pub fn record(&self, kind: ErrorKind, message: impl Into<String>) {
        let record = ErrorRecord {
            kind,
            phase: self.phase(),
            at: Utc::now(),
            message: message.into(),
        };

        let mut inner = self.inner.lock();
        inner.total += 1;
        *inner.by_kind.entry(kind).or_default() += 1;
        *inner.by_phase.entry(record.phase).or_default() += 1;
        let records = inner.records.entry(kind).or_default();
        if records.len() < self.capacity {
            records.push(record);
        }
    }

    pub fn total(&self) -> u64 {
        self.inner.lock().total
    }

    pub fn count(&self, kind: ErrorKind) -> u64 {
        self.inner.lock().by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn count_in(&self, phase: Phase) -> u64 {
        self.inner.lock().by_phase.get(&phase).copied().unwrap_or(0)
    }

    pub fn records(&self, kind: ErrorKind) -> Vec<ErrorRecord> {
        self.inner
            .lock()
            .records
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.lock();
        LedgerSnapshot {
            total: inner.total,
            by_kind: inner.by_kind.clone(),
            by_phase: inner.by_phase.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind_and_phase() {
        let ledger = ErrorLedger::new(10);
        ledger.record(ErrorKind::Request, "bad status");
        ledger.set_phase(Phase::Load);
        ledger.record(ErrorKind::Request, "bad body");
        ledger.record(ErrorKind::Agent, "no agent");

        assert_eq!(ledger.total(), 3);
        assert_eq!(ledger.count(ErrorKind::Request), 2);
        assert_eq!(ledger.count(ErrorKind::LoadJson), 0);
        assert_eq!(ledger.count_in(Phase::Prepare), 1);
        assert_eq!(ledger.count_in(Phase::Load), 2);
    }

    #[test]
    fn test_total_is_sum_of_kinds() {
        let ledger = ErrorLedger::default();
        for i in 0..7 {
            let kind = ErrorKind::all()[i % ErrorKind::all().len()];
            ledger.record(kind, format!("failure {i}"));
        }
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.total, snapshot.by_kind.values().sum::<u64>());
        assert_eq!(snapshot.total, snapshot.by_phase.values().sum::<u64>());
    }

    #[test]
    fn test_descriptors_are_capped_but_counts_are_not() {
        let ledger = ErrorLedger::new(2);
        for i in 0..5 {
            ledger.record(ErrorKind::Request, format!("failure {i}"));
        }
        assert_eq!(ledger.count(ErrorKind::Request), 5);
        let records = ledger.records(ErrorKind::Request);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "failure 0");
        assert_eq!(records[0].phase, Phase::Prepare);
    }
}
