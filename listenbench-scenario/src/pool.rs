//! User pools
//!
//! Each persona draws users from its own pool. A checked-out user is held
//! exclusively until its guard drops, which closes the agent's idle
//! connections and puts the user back.

use listenbench_http::User;
use parking_lot::Mutex;
use rand::Rng;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Wait between attempts on an empty pool
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct UserPool {
    name: &'static str,
    users: Mutex<Vec<Arc<User>>>,
}

impl UserPool {
    pub fn new(name: &'static str, users: Vec<Arc<User>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            users: Mutex::new(users),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Users currently available
    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }

    pub fn contains(&self, account: &str) -> bool {
        self.users.lock().iter().any(|u| u.account() == account)
    }

    fn take_random(&self) -> Option<Arc<User>> {
        let mut users = self.users.lock();
        if users.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..users.len());
        Some(users.swap_remove(index))
    }

    fn put_back(&self, user: Arc<User>) {
        self.users.lock().push(user);
    }

    /// Take a random user, waiting while the pool is empty.
    ///
    /// Returns `None` once `token` is cancelled.
    pub async fn checkout(self: &Arc<Self>, token: &CancellationToken) -> Option<CheckedOutUser> {
        loop {
            if token.is_cancelled() {
                return None;
            }
            if let Some(user) = self.take_random() {
                return Some(CheckedOutUser {
                    user,
                    pool: Arc::clone(self),
                });
            }
            trace!("{} pool is empty, waiting", self.name);
            tokio::select! {
                _ = token.cancelled() => return None,
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }
}

/// Exclusive hold on a pooled user
#[derive(Debug)]
pub struct CheckedOutUser {
    user: Arc<User>,
    pool: Arc<UserPool>,
}

impl Deref for CheckedOutUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.user
    }
}

impl Drop for CheckedOutUser {
    fn drop(&mut self) {
        self.user.release_connections();
        self.pool.put_back(Arc::clone(&self.user));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listenbench_core::UserProfile;

    fn users(n: usize) -> Vec<Arc<User>> {
        (0..n)
            .map(|i| Arc::new(User::new(UserProfile::new(format!("user{i}"), "pw"))))
            .collect()
    }

    #[tokio::test]
    async fn test_checkout_is_exclusive_and_returns_on_drop() {
        let pool = UserPool::new("normal", users(1));
        let token = CancellationToken::new();

        let held = pool.checkout(&token).await.unwrap();
        assert_eq!(held.account(), "user0");
        assert!(pool.is_empty());

        drop(held);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains("user0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pool_waits_for_return() {
        let pool = UserPool::new("heavy", users(1));
        let token = CancellationToken::new();
        let held = pool.checkout(&token).await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            let token = token.clone();
            tokio::spawn(async move { pool.checkout(&token).await.map(|u| u.account().to_string()) })
        };

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!waiter.is_finished());
        drop(held);

        let account = waiter.await.unwrap();
        assert_eq!(account.as_deref(), Some("user0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_checkout_returns_none() {
        let pool = UserPool::new("banned", Vec::new());
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            canceller.cancel();
        });
        assert!(pool.checkout(&token).await.is_none());
    }
}
