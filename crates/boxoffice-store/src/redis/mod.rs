//! Redis store backend.

mod client;
mod store;

pub use client::RedisClient;
pub use store::RedisLockStore;
