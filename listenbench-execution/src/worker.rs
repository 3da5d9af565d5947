//! Worker with dynamic parallelism
//!
//! Parallelism is a semaphore whose permit count tracks the target level.
//! Each invocation holds one permit. Raising the level adds permits, which
//! running workers pick up on their next acquire. Lowering it forgets idle
//! permits immediately and retires the rest as their holders finish.

use crate::error::WorkerError;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

type ScenarioFn = Arc<dyn Fn(CancellationToken, u64) -> BoxFuture<'static, ()> + Send + Sync>;

/// How many times a worker runs its closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Exactly this many invocations, then wait for them to finish
    Count(u64),
    /// Until the token is cancelled
    Infinite,
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub parallelism: usize,
    /// Hard ceiling; `None` lets the level grow without bound
    pub max_parallelism: Option<usize>,
    pub mode: LoopMode,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            max_parallelism: None,
            mode: LoopMode::Infinite,
        }
    }
}

impl WorkerOptions {
    pub fn bounded(parallelism: usize, max: usize) -> Self {
        Self {
            parallelism,
            max_parallelism: Some(max),
            mode: LoopMode::Infinite,
        }
    }

    pub fn unbounded(parallelism: usize) -> Self {
        Self {
            parallelism,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: LoopMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug)]
struct Parallelism {
    semaphore: Arc<Semaphore>,
    target: Mutex<usize>,
    /// Permits to forget as their holders return them
    retiring: AtomicUsize,
    max: Option<usize>,
}

impl Parallelism {
    fn clamp(&self, n: usize) -> usize {
        match self.max {
            Some(max) => n.min(max),
            None => n,
        }
    }

    fn set(&self, n: usize) -> usize {
        let n = self.clamp(n);
        let mut target = self.target.lock();

        if n > *target {
            let mut grow = n - *target;
            // Cancel pending retirements before minting new permits
            while grow > 0 {
                let retiring = self.retiring.load(Ordering::Acquire);
                if retiring == 0 {
                    break;
                }
                let reclaim = retiring.min(grow);
                if self
                    .retiring
                    .compare_exchange(retiring, retiring - reclaim, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    grow -= reclaim;
                }
            }
            self.semaphore.add_permits(grow);
        } else if n < *target {
            let shrink = *target - n;
            let mut forgotten = 0;
            while forgotten < shrink {
                match Arc::clone(&self.semaphore).try_acquire_owned() {
                    Ok(permit) => {
                        permit.forget();
                        forgotten += 1;
                    }
                    Err(_) => break,
                }
            }
            self.retiring.fetch_add(shrink - forgotten, Ordering::AcqRel);
        }

        *target = n;
        n
    }

    fn take_retirement(&self) -> bool {
        self.retiring
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Permit held for the lifetime of one invocation. Runs on unwind too.
struct Slot {
    permit: Option<OwnedSemaphorePermit>,
    parallelism: Arc<Parallelism>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            if self.parallelism.take_retirement() {
                permit.forget();
            }
        }
    }
}

/// Runs a scenario closure repeatedly at an adjustable parallelism level
pub struct Worker {
    name: String,
    func: ScenarioFn,
    mode: LoopMode,
    parallelism: Arc<Parallelism>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("parallelism", &self.parallelism())
            .finish()
    }
}

impl Worker {
    /// Create a worker. `func` receives the run token and the invocation
    /// sequence number.
    pub fn new<F, Fut>(name: impl Into<String>, options: WorkerOptions, func: F) -> Result<Self, WorkerError>
    where
        F: Fn(CancellationToken, u64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        if let Some(max) = options.max_parallelism {
            if max == 0 {
                return Err(WorkerError::ZeroMaxParallelism { name });
            }
            if options.parallelism > max {
                return Err(WorkerError::ParallelismAboveMax {
                    name,
                    requested: options.parallelism,
                    max,
                });
            }
        }

        let func: ScenarioFn =
            Arc::new(move |token: CancellationToken, seq: u64| func(token, seq).boxed());
        Ok(Self {
            name,
            func,
            mode: options.mode,
            parallelism: Arc::new(Parallelism {
                semaphore: Arc::new(Semaphore::new(options.parallelism)),
                target: Mutex::new(options.parallelism),
                retiring: AtomicUsize::new(0),
                max: options.max_parallelism,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current target level
    pub fn parallelism(&self) -> usize {
        *self.parallelism.target.lock()
    }

    /// Change the level by `delta`, clamped to `0..=max`. Returns the new level.
    pub fn add_parallelism(&self, delta: i64) -> usize {
        let current = self.parallelism() as i64;
        let next = (current + delta).max(0) as usize;
        let applied = self.parallelism.set(next);
        debug!("worker {} parallelism {} -> {}", self.name, current, applied);
        applied
    }

    /// Set the level, clamped to the maximum. Returns the applied level.
    pub fn set_parallelism(&self, n: usize) -> usize {
        self.parallelism.set(n)
    }

    /// Run until the loop mode is exhausted or `token` is cancelled.
    ///
    /// Returns only after every in-flight invocation has returned. A
    /// panicking invocation is logged and does not stop the worker.
    pub async fn process(&self, token: CancellationToken) {
        let mut tasks = JoinSet::new();
        let mut seq: u64 = 0;

        loop {
            if let LoopMode::Count(count) = self.mode {
                if seq >= count {
                    break;
                }
            }

            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                permit = Arc::clone(&self.parallelism.semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            while let Some(result) = tasks.try_join_next() {
                self.report(result);
            }

            let slot = Slot {
                permit: Some(permit),
                parallelism: Arc::clone(&self.parallelism),
            };
            let invocation = (self.func)(token.clone(), seq);
            tasks.spawn(async move {
                let _slot = slot;
                invocation.await;
            });
            seq += 1;
        }

        while let Some(result) = tasks.join_next().await {
            self.report(result);
        }
        debug!("worker {} stopped after {} invocations", self.name, seq);
    }

    fn report(&self, result: Result<(), JoinError>) {
        let Err(err) = result else {
            return;
        };
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!("worker {}: invocation panicked: {}", self.name, message);
        } else {
            debug!("worker {}: invocation cancelled", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_worker(options: WorkerOptions) -> Result<Worker, WorkerError> {
        Worker::new("test", options, |_token, _seq| async {})
    }

    #[test]
    fn test_bounded_clamps_growth() {
        let worker = noop_worker(WorkerOptions::bounded(1, 2)).unwrap();
        assert_eq!(worker.add_parallelism(10), 2);
        assert_eq!(worker.parallelism(), 2);
    }

    #[test]
    fn test_shrink_never_goes_negative() {
        let worker = noop_worker(WorkerOptions::unbounded(3)).unwrap();
        assert_eq!(worker.add_parallelism(-10), 0);
        assert_eq!(worker.parallelism.semaphore.available_permits(), 0);
    }

    #[test]
    fn test_idle_permits_forgotten_immediately() {
        let worker = noop_worker(WorkerOptions::unbounded(5)).unwrap();
        worker.set_parallelism(2);
        assert_eq!(worker.parallelism.semaphore.available_permits(), 2);
        assert_eq!(worker.parallelism.retiring.load(Ordering::Acquire), 0);

        worker.set_parallelism(4);
        assert_eq!(worker.parallelism.semaphore.available_permits(), 4);
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            noop_worker(WorkerOptions::bounded(3, 1)),
            Err(WorkerError::ParallelismAboveMax { requested: 3, max: 1, .. })
        ));
        assert!(matches!(
            noop_worker(WorkerOptions::bounded(0, 0)),
            Err(WorkerError::ZeroMaxParallelism { .. })
        ));
    }
}
