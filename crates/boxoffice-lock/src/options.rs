//! Lock acquisition strategy and budgets.

use std::time::Duration;

use boxoffice_core::config::lock::LockConfig;

/// How an acquisition waits when a key is already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrategy {
    /// One attempt; fail immediately on contention.
    Simple,
    /// Poll until acquired, the wait timeout elapses, or retries run out.
    Spin,
    /// Block on the release notification channel; falls back to `Spin`
    /// behavior when the channel cannot be subscribed.
    PubSub,
}

/// Budgets for a single `with_lock` call.
///
/// Every blocking acquisition carries an explicit timeout; there is no
/// unbounded wait under any strategy.
#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    /// Wait policy under contention.
    pub strategy: LockStrategy,
    /// TTL stamped on each acquired lock record.
    pub lock_ttl: Duration,
    /// Maximum total wait across all attempts.
    pub wait_timeout: Duration,
    /// Sleep between spin attempts.
    pub retry_interval: Duration,
    /// Maximum number of spin attempts.
    pub max_retries: u32,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            strategy: LockStrategy::Spin,
            lock_ttl: Duration::from_millis(10_000),
            wait_timeout: Duration::from_millis(5_000),
            retry_interval: Duration::from_millis(50),
            max_retries: 100,
        }
    }
}

impl LockOptions {
    /// Build options from configuration with the given strategy.
    pub fn from_config(config: &LockConfig, strategy: LockStrategy) -> Self {
        Self {
            strategy,
            lock_ttl: Duration::from_millis(config.ttl_ms),
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            max_retries: config.max_retries,
        }
    }

    /// Override the wait timeout.
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Override the strategy.
    pub fn with_strategy(mut self, strategy: LockStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
