//! Lock store trait for pluggable coordination backends.
//!
//! The shared store is the only serialization point in the booking
//! subsystem; every cross-process coordination primitive (lock records,
//! the waiting queue, the active set, release notifications) crosses
//! process boundaries through an implementation of [`LockStore`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::result::AppResult;

/// A live subscription to a notification channel.
///
/// Backends deliver messages through an internal forwarding task so that
/// callers see one uniform receiver regardless of backend.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<String>,
}

impl Subscription {
    /// Wrap a receiver produced by a backend's forwarding task.
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Wait for the next message. Returns `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Trait for coordination store backends (Redis or in-memory).
///
/// Implementations must make each individual operation atomic with respect
/// to concurrent callers. Compound invariants that span several operations
/// (such as the capacity check in the admission queue's drain) are NOT the
/// store's job; those are guarded by the distributed lock built on top of
/// `set_nx` and `compare_and_delete`.
#[async_trait]
pub trait LockStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value, overwriting any existing value.
    ///
    /// With `Some(ttl)` the key lapses after the TTL; with `None` it
    /// persists until deleted or overwritten. Records that must outlive
    /// an unbounded wait (a queued admission token) are stored without
    /// a TTL and only get one once they reach a terminal state.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// Set a value with a TTL only if the key does not already exist.
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete a key unconditionally.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Delete a key only if its stored value equals `expected`.
    ///
    /// Returns `true` if the key was deleted. A mismatched or absent value
    /// is a no-op returning `false`, never an error; this is the "safe
    /// release" primitive the lock's correctness rests on.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool>;

    /// Append a value to the tail of an ordered list.
    async fn list_push_back(&self, key: &str, value: &str) -> AppResult<u64>;

    /// Pop the value at the head of an ordered list.
    async fn list_pop_front(&self, key: &str) -> AppResult<Option<String>>;

    /// Length of an ordered list (0 if absent).
    async fn list_len(&self, key: &str) -> AppResult<u64>;

    /// Zero-based index of the first occurrence of `value`, if present.
    async fn list_index_of(&self, key: &str, value: &str) -> AppResult<Option<u64>>;

    /// Remove all occurrences of `value` from a list. Returns the count removed.
    async fn list_remove(&self, key: &str, value: &str) -> AppResult<u64>;

    /// Add a member to a set. Returns `true` if it was not already present.
    async fn set_add(&self, key: &str, member: &str) -> AppResult<bool>;

    /// Remove a member from a set. Returns `true` if it was present.
    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool>;

    /// Cardinality of a set (0 if absent).
    async fn set_len(&self, key: &str) -> AppResult<u64>;

    /// All members of a set.
    async fn set_members(&self, key: &str) -> AppResult<Vec<String>>;

    /// Publish a message on a notification channel.
    async fn publish(&self, channel: &str, message: &str) -> AppResult<()>;

    /// Subscribe to a notification channel.
    async fn subscribe(&self, channel: &str) -> AppResult<Subscription>;

    /// Check that the store backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_str(&value)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value by serializing to JSON.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }
}
