//! Redis lock store implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::debug;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::store::{LockStore, Subscription};

use super::client::RedisClient;

/// Capacity of each pub/sub forwarding channel.
const CHANNEL_CAPACITY: usize = 64;

/// Lua script for compare-and-delete.
///
/// Deleting only when the stored value matches is the "safe release"
/// primitive: a mismatched or absent value must be a no-op so that one
/// holder can never free a lock owned by another.
///
/// KEYS[1] = lock key
/// ARGV[1] = expected owner value
const COMPARE_AND_DELETE_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    else
        return 0
    end
"#;

/// Redis-backed lock store for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisLockStore {
    /// Shared client and connection manager.
    client: RedisClient,
}

impl RedisLockStore {
    /// Create a new Redis lock store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let result: Option<String> = conn.get(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        match ttl {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(&full_key, value, ttl.as_secs().max(1))
                    .await
                    .map_err(Self::map_err)?;
            }
            None => {
                let _: () = conn.set(&full_key, value).await.map_err(Self::map_err)?;
            }
        }
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        // SET NX PX in one round trip; PX keeps sub-second lock TTLs exact.
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(result.is_some())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let deleted: i64 = redis::Script::new(COMPARE_AND_DELETE_SCRIPT)
            .key(&full_key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(deleted > 0)
    }

    async fn list_push_back(&self, key: &str, value: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = conn.rpush(&full_key, value).await.map_err(Self::map_err)?;
        Ok(len)
    }

    async fn list_pop_front(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let value: Option<String> = conn.lpop(&full_key, None).await.map_err(Self::map_err)?;
        Ok(value)
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = conn.llen(&full_key).await.map_err(Self::map_err)?;
        Ok(len)
    }

    async fn list_index_of(&self, key: &str, value: &str) -> AppResult<Option<u64>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let index: Option<u64> = redis::cmd("LPOS")
            .arg(&full_key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(index)
    }

    async fn list_remove(&self, key: &str, value: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let removed: u64 = conn.lrem(&full_key, 0, value).await.map_err(Self::map_err)?;
        Ok(removed)
    }

    async fn set_add(&self, key: &str, member: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let added: i64 = conn.sadd(&full_key, member).await.map_err(Self::map_err)?;
        Ok(added > 0)
    }

    async fn set_remove(&self, key: &str, member: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let removed: i64 = conn.srem(&full_key, member).await.map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn set_len(&self, key: &str) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let len: u64 = conn.scard(&full_key).await.map_err(Self::map_err)?;
        Ok(len)
    }

    async fn set_members(&self, key: &str) -> AppResult<Vec<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let members: Vec<String> = conn.smembers(&full_key).await.map_err(Self::map_err)?;
        Ok(members)
    }

    async fn publish(&self, channel: &str, message: &str) -> AppResult<()> {
        let full_channel = self.client.prefixed_key(channel);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .publish(&full_channel, message)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> AppResult<Subscription> {
        let full_channel = self.client.prefixed_key(channel);

        let mut pubsub = self
            .client
            .client()
            .get_async_pubsub()
            .await
            .map_err(Self::map_err)?;
        pubsub
            .subscribe(&full_channel)
            .await
            .map_err(Self::map_err)?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            loop {
                tokio::select! {
                    // Subscriber dropped; end now so the pub/sub
                    // connection closes instead of lingering until the
                    // next message.
                    _ = tx.closed() => break,
                    msg = stream.next() => {
                        let Some(msg) = msg else { break };
                        let payload: String = msg.get_payload().unwrap_or_default();
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(channel = %full_channel, "Pub/sub forwarding task ended");
        });

        Ok(Subscription::new(rx))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
