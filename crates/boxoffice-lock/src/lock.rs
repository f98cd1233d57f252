//! The distributed lock.

use std::future::Future;
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::store::{LockStore, Subscription};
use boxoffice_store::{StoreManager, keys};

use crate::options::{LockOptions, LockStrategy};

/// Outcome of one all-or-nothing acquisition attempt.
enum Acquisition {
    /// Every key is now held by this owner value.
    Acquired,
    /// A key was contended; everything acquired in the attempt was released.
    Busy,
}

/// Distributed mutual-exclusion primitive over the coordination store.
///
/// Every call acquires its keys in sorted order under a fresh owner value,
/// runs the guarded action, and always releases afterwards. The sorted
/// global order is the deadlock-avoidance mechanism: two callers whose key
/// sets overlap always attempt acquisition in the same relative order.
#[derive(Debug, Clone)]
pub struct DistributedLock {
    store: StoreManager,
}

impl DistributedLock {
    /// Create a new distributed lock over the given store.
    pub fn new(store: StoreManager) -> Self {
        Self { store }
    }

    /// Execute `action` exactly once while holding all `keys`, or fail
    /// with a `LockUnavailable` error without running it.
    ///
    /// Release always happens, whether `action` succeeds or fails.
    pub async fn with_lock<T, F, Fut>(
        &self,
        keys: &[String],
        options: &LockOptions,
        action: F,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let keys = normalize_keys(keys)?;
        let owner = Uuid::new_v4().to_string();

        self.acquire(&keys, &owner, options).await?;
        debug!(keys = ?keys, "Lock acquired");

        let result = action().await;

        self.release_all(&keys, &owner).await;
        debug!(keys = ?keys, "Lock released");

        result
    }

    /// Acquire all keys according to the configured wait policy.
    async fn acquire(&self, keys: &[String], owner: &str, options: &LockOptions) -> AppResult<()> {
        match options.strategy {
            LockStrategy::Simple => match self.try_acquire_all(keys, owner, options).await? {
                Acquisition::Acquired => Ok(()),
                Acquisition::Busy => Err(AppError::lock_unavailable(keys)),
            },
            LockStrategy::Spin => {
                let deadline = Instant::now() + options.wait_timeout;
                self.acquire_spin(keys, owner, options, deadline).await
            }
            LockStrategy::PubSub => self.acquire_pub_sub(keys, owner, options).await,
        }
    }

    /// One all-or-nothing pass over the sorted key set.
    ///
    /// On the first contended key, every key already acquired in this
    /// attempt is released before reporting `Busy`.
    async fn try_acquire_all(
        &self,
        keys: &[String],
        owner: &str,
        options: &LockOptions,
    ) -> AppResult<Acquisition> {
        let mut acquired: Vec<String> = Vec::with_capacity(keys.len());

        for key in keys {
            match self.store.set_nx(key, owner, options.lock_ttl).await {
                Ok(true) => acquired.push(key.clone()),
                Ok(false) => {
                    debug!(key = %key, "Lock key contended, rolling back attempt");
                    self.release_all(&acquired, owner).await;
                    return Ok(Acquisition::Busy);
                }
                Err(e) => {
                    self.release_all(&acquired, owner).await;
                    return Err(e);
                }
            }
        }

        Ok(Acquisition::Acquired)
    }

    /// Poll until acquired, the deadline passes, or retries run out.
    async fn acquire_spin(
        &self,
        keys: &[String],
        owner: &str,
        options: &LockOptions,
        deadline: Instant,
    ) -> AppResult<()> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            if let Acquisition::Acquired = self.try_acquire_all(keys, owner, options).await? {
                return Ok(());
            }

            if attempts >= options.max_retries
                || Instant::now() + options.retry_interval >= deadline
            {
                return Err(AppError::lock_unavailable(keys));
            }

            tokio::time::sleep(options.retry_interval).await;
        }
    }

    /// Block on the release notification channels instead of polling.
    ///
    /// Re-attempts acquisition on every notification, bounded by the wait
    /// timeout. If any channel cannot be subscribed, degrades to spin
    /// behavior for the remaining budget.
    async fn acquire_pub_sub(
        &self,
        keys: &[String],
        owner: &str,
        options: &LockOptions,
    ) -> AppResult<()> {
        let deadline = Instant::now() + options.wait_timeout;

        if let Acquisition::Acquired = self.try_acquire_all(keys, owner, options).await? {
            return Ok(());
        }

        let mut subscriptions: Vec<Subscription> = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.subscribe(&keys::release_channel(key)).await {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => {
                    warn!(key = %key, error = %e, "Release channel unavailable, falling back to spin");
                    return self.acquire_spin(keys, owner, options, deadline).await;
                }
            }
        }

        loop {
            if let Acquisition::Acquired = self.try_acquire_all(keys, owner, options).await? {
                return Ok(());
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(AppError::lock_unavailable(keys));
            };

            match tokio::time::timeout(remaining, wait_any(&mut subscriptions)).await {
                // Timed out waiting for a release.
                Err(_) => return Err(AppError::lock_unavailable(keys)),
                // Notified; re-attempt immediately.
                Ok(true) => continue,
                // Channels went away mid-wait; degrade to one polling sleep.
                Ok(false) => {
                    if Instant::now() + options.retry_interval >= deadline {
                        return Err(AppError::lock_unavailable(keys));
                    }
                    tokio::time::sleep(options.retry_interval).await;
                }
            }
        }
    }

    /// Release every key in the set that this owner still holds.
    ///
    /// Iterating the full sorted key set is deliberate: compare-and-delete
    /// is a no-op for keys this owner does not hold, so releasing is safe
    /// regardless of how far an acquisition attempt got. Each key actually
    /// deleted publishes a release notification so blocked waiters wake
    /// immediately.
    async fn release_all(&self, keys: &[String], owner: &str) {
        for key in keys {
            match self.store.compare_and_delete(key, owner).await {
                Ok(true) => {
                    if let Err(e) = self.store.publish(&keys::release_channel(key), key).await {
                        warn!(key = %key, error = %e, "Failed to publish release notification");
                    }
                }
                Ok(false) => {
                    // Not held by this owner (never acquired, or the TTL
                    // lapsed and someone else holds it now). Nothing to do.
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to release lock key");
                }
            }
        }
    }
}

/// Sort and deduplicate the requested keys; reject an empty set.
fn normalize_keys(keys: &[String]) -> AppResult<Vec<String>> {
    if keys.is_empty() {
        return Err(AppError::internal("with_lock requires at least one key"));
    }
    let mut keys = keys.to_vec();
    keys.sort();
    keys.dedup();
    Ok(keys)
}

/// Wait until any subscription yields a message.
///
/// Returns `false` when every channel has closed, which tells the caller
/// to stop relying on notifications.
async fn wait_any(subscriptions: &mut [Subscription]) -> bool {
    if subscriptions.is_empty() {
        return false;
    }
    let receives: Vec<_> = subscriptions
        .iter_mut()
        .map(|s| Box::pin(s.recv()))
        .collect();
    let (message, _, _) = futures::future::select_all(receives).await;
    message.is_some()
}
