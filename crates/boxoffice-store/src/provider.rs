//! Store manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use boxoffice_core::config::store::StoreConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::store::{LockStore, Subscription};

/// Store manager that wraps the configured lock store backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store backend.
    inner: Arc<dyn LockStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub async fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn LockStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis lock store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisLockStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory lock store");
                Arc::new(crate::memory::MemoryLockStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing backend (for testing).
    pub fn from_store(store: Arc<dyn LockStore>) -> Self {
        Self { inner: store }
    }

    /// Get a reference to the inner backend.
    pub fn store(&self) -> &dyn LockStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl LockStore for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        self.inner.compare_and_delete(key, expected).await
    }

    async fn list_push_back(&self, key: &str, value: &str) -> AppResult<u64> {
        self.inner.list_push_back(key, value).await
    }

    async fn list_pop_front(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.list_pop_front(key).await
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        self.inner.list_len(key).await
    }

    async fn list_index_of(&self, key: &str, value: &str) -> AppResult<Option<u64>> {
        self.inner.list_index_of(key, value).await
    }

    async fn list_remove(&self, key: &str, value: &str) -> AppResult<u64> {
        self.inner.list_remove(key, value).await
    }

    async fn set_add(&self, key: &str, member: &str) -> AppResult<bool> {
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool> {
        self.inner.set_remove(key, member).await
    }

    async fn set_len(&self, key: &str) -> AppResult<u64> {
        self.inner.set_len(key).await
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn publish(&self, channel: &str, message: &str) -> AppResult<()> {
        self.inner.publish(channel, message).await
    }

    async fn subscribe(&self, channel: &str) -> AppResult<Subscription> {
        self.inner.subscribe(channel).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
