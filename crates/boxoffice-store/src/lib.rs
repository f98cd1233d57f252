//! # boxoffice-store
//!
//! Coordination store backends for BoxOffice. Implements the
//! [`LockStore`](boxoffice_core::traits::LockStore) trait over Redis for
//! multi-node deployments and over an in-process mutex for single-node
//! deployments and tests, plus the key/channel builders shared by every
//! component that touches the store.

pub mod keys;
pub mod provider;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::StoreManager;

#[cfg(feature = "memory")]
pub use memory::MemoryLockStore;

#[cfg(feature = "redis-backend")]
pub use redis::{RedisClient, RedisLockStore};
