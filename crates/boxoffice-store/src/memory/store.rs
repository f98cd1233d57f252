//! In-memory lock store using a Tokio mutex for single-node deployments.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, mpsc};

use boxoffice_core::result::AppResult;
use boxoffice_core::traits::store::{LockStore, Subscription};

/// Capacity of each pub/sub bridge channel.
const CHANNEL_CAPACITY: usize = 64;

/// A stored value with an optional expiry instant.
#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Internal state for the memory-based lock store.
#[derive(Debug, Default)]
struct Inner {
    /// Plain key-value entries (lock records, token records, indexes).
    values: HashMap<String, Entry>,
    /// Ordered lists (the waiting queue).
    lists: HashMap<String, VecDeque<String>>,
    /// Unordered sets (the active set).
    sets: HashMap<String, HashSet<String>>,
    /// Pub/sub channels.
    channels: HashMap<String, broadcast::Sender<String>>,
}

impl Inner {
    /// Drop an entry if it has lapsed, then return whether it is live.
    fn purge_expired(&mut self, key: &str, now: Instant) -> bool {
        if let Some(entry) = self.values.get(key) {
            if entry.is_expired(now) {
                self.values.remove(key);
                return false;
            }
            return true;
        }
        false
    }
}

/// In-memory lock store using a Tokio mutex for thread safety.
///
/// Every operation runs under one mutex, so each call is atomic with
/// respect to concurrent callers, matching the contract the Redis
/// backend gets from Redis's single-threaded command execution.
/// Suitable for single-node deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    /// Protected inner state.
    inner: Arc<Mutex<Inner>>,
}

impl MemoryLockStore {
    /// Creates a new empty memory-based lock store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut inner = self.inner.lock().await;
        if !inner.purge_expired(key, Instant::now()) {
            return Ok(None);
        }
        Ok(inner.values.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        if inner.purge_expired(key, now) {
            return Ok(false);
        }
        inner.values.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.values.remove(key);
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        if !inner.purge_expired(key, Instant::now()) {
            return Ok(false);
        }
        match inner.values.get(key) {
            Some(entry) if entry.value == expected => {
                inner.values.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_push_back(&self, key: &str, value: &str) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());
        Ok(list.len() as u64)
    }

    async fn list_pop_front(&self, key: &str) -> AppResult<Option<String>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.lists.get_mut(key).and_then(|l| l.pop_front()))
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.lists.get(key).map_or(0, |l| l.len() as u64))
    }

    async fn list_index_of(&self, key: &str, value: &str) -> AppResult<Option<u64>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .lists
            .get(key)
            .and_then(|l| l.iter().position(|v| v == value))
            .map(|i| i as u64))
    }

    async fn list_remove(&self, key: &str, value: &str) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|v| v != value);
        Ok((before - list.len()) as u64)
    }

    async fn set_add(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.sets.get_mut(key).is_some_and(|s| s.remove(member)))
    }

    async fn set_len(&self, key: &str) -> AppResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.sets.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn publish(&self, channel: &str, message: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(sender) = inner.channels.get(channel) {
            // A send error means no live subscribers remain; drop the
            // entry so the channel map does not grow without bound.
            if sender.send(message.to_string()).is_err() {
                inner.channels.remove(channel);
            }
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> AppResult<Subscription> {
        let mut inner = self.inner.lock().await;
        let sender = inner
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        let mut broadcast_rx = sender.subscribe();
        drop(inner);

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Subscriber dropped; end immediately instead of
                    // lingering until the next message.
                    _ = tx.closed() => break,
                    result = broadcast_rx.recv() => match result {
                        Ok(message) => {
                            if tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        // A lagged waiter only missed wake-ups; keep listening.
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Subscription::new(rx))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_nx_respects_existing_key() {
        let store = MemoryLockStore::new();
        let ttl = Duration::from_secs(10);
        assert!(store.set_nx("k", "a", ttl).await.unwrap());
        assert!(!store.set_nx("k", "b", ttl).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_set_nx_succeeds_after_expiry() {
        let store = MemoryLockStore::new();
        assert!(store.set_nx("k", "a", Duration::from_millis(10)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.set_nx("k", "b", Duration::from_secs(10)).await.unwrap());
    }

    #[tokio::test]
    async fn test_compare_and_delete_is_safe() {
        let store = MemoryLockStore::new();
        let ttl = Duration::from_secs(10);
        store.set_nx("k", "owner-a", ttl).await.unwrap();

        // Wrong owner value is a no-op, not an error.
        assert!(!store.compare_and_delete("k", "owner-b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("owner-a".to_string()));

        assert!(store.compare_and_delete("k", "owner-a").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);

        // Absent key is also a no-op.
        assert!(!store.compare_and_delete("k", "owner-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_fifo_order() {
        let store = MemoryLockStore::new();
        store.list_push_back("q", "t1").await.unwrap();
        store.list_push_back("q", "t2").await.unwrap();
        store.list_push_back("q", "t3").await.unwrap();

        assert_eq!(store.list_len("q").await.unwrap(), 3);
        assert_eq!(store.list_index_of("q", "t2").await.unwrap(), Some(1));
        assert_eq!(store.list_pop_front("q").await.unwrap(), Some("t1".to_string()));
        assert_eq!(store.list_index_of("q", "t2").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_list_remove_counts_occurrences() {
        let store = MemoryLockStore::new();
        store.list_push_back("q", "x").await.unwrap();
        store.list_push_back("q", "y").await.unwrap();
        store.list_push_back("q", "x").await.unwrap();
        assert_eq!(store.list_remove("q", "x").await.unwrap(), 2);
        assert_eq!(store.list_len("q").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_membership() {
        let store = MemoryLockStore::new();
        assert!(store.set_add("s", "a").await.unwrap());
        assert!(!store.set_add("s", "a").await.unwrap());
        assert_eq!(store.set_len("s").await.unwrap(), 1);
        assert!(store.set_remove("s", "a").await.unwrap());
        assert!(!store.set_remove("s", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let store = MemoryLockStore::new();
        let mut sub = store.subscribe("ch").await.unwrap();
        store.publish("ch", "released").await.unwrap();
        let message = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("should receive before timeout");
        assert_eq!(message, Some("released".to_string()));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let store = MemoryLockStore::new();
        store.publish("nobody", "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_without_ttl_persists() {
        let store = MemoryLockStore::new();
        store.set("forever", "v", None).await.unwrap();
        store
            .set("fleeting", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("forever").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("fleeting").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_channel_recovers_after_subscriber_drop() {
        let store = MemoryLockStore::new();

        let first = store.subscribe("ch").await.unwrap();
        drop(first);
        // Let the forwarding task observe the dropped receiver.
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.publish("ch", "unheard").await.unwrap();

        let mut second = store.subscribe("ch").await.unwrap();
        store.publish("ch", "heard").await.unwrap();
        let message = tokio::time::timeout(Duration::from_secs(1), second.recv())
            .await
            .expect("should receive before timeout");
        assert_eq!(message, Some("heard".to_string()));
    }
}
