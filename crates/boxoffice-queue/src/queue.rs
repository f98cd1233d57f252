//! The token admission queue.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use boxoffice_core::config::queue::QueueConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::store::LockStore;
use boxoffice_core::types::id::{TokenId, UserId};
use boxoffice_core::types::token::{AdmissionToken, TokenStatus};
use boxoffice_lock::{DistributedLock, LockOptions, LockStrategy};
use boxoffice_store::{StoreManager, keys};

/// How long expired token records stay queryable.
///
/// Live (waiting or active) records carry no TTL at all: a waiting token
/// has no age limit, and active tokens are retired by the reaper, not by
/// record expiry. The retention clock starts only once a token reaches
/// its terminal status.
const TOKEN_RECORD_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Capacity-bounded FIFO admission queue.
///
/// Token records, the waiting list, and the active set all live in the
/// coordination store, so every service instance sees the same queue.
/// The store's native list and set operations are atomic on their own;
/// only [`drain`](Self::drain) needs more, because its capacity check
/// spans several operations, and that is serialized under the global
/// drain lock.
#[derive(Debug, Clone)]
pub struct AdmissionQueue {
    store: StoreManager,
    lock: DistributedLock,
    config: QueueConfig,
    lock_options: LockOptions,
}

impl AdmissionQueue {
    /// Create a new admission queue.
    pub fn new(store: StoreManager, lock: DistributedLock, config: QueueConfig) -> Self {
        Self {
            store,
            lock,
            config,
            lock_options: LockOptions::default().with_strategy(LockStrategy::Spin),
        }
    }

    /// Override the options for the locks guarding `drain` and `enroll`.
    pub fn with_lock_options(mut self, options: LockOptions) -> Self {
        self.lock_options = options;
        self
    }

    /// Enroll a caller, returning a fresh `Waiting` token at the queue tail.
    ///
    /// A caller holds at most one live token: any prior non-expired token
    /// for the same user is expired first. Serialized per user so two
    /// simultaneous enrolls cannot both miss the prior token and leave
    /// two live ones.
    pub async fn enroll(&self, user_id: UserId) -> AppResult<AdmissionToken> {
        let guard = [keys::token_enroll(user_id)];
        self.lock
            .with_lock(&guard, &self.lock_options, || self.enroll_locked(user_id))
            .await
    }

    /// The enroll body; must only run under the user's enroll lock.
    async fn enroll_locked(&self, user_id: UserId) -> AppResult<AdmissionToken> {
        if let Some(previous_id) = self.store.get(&keys::user_token(user_id)).await? {
            let previous_id = parse_token_id(&previous_id)?;
            if let Some(mut previous) = self
                .store
                .get_json::<AdmissionToken>(&keys::token_record(previous_id))
                .await?
            {
                if previous.is_live() {
                    info!(user_id = %user_id, token_id = %previous.id, "Expiring prior token on re-enroll");
                    self.expire_token(&mut previous).await?;
                }
            }
        }

        let token = AdmissionToken::enroll(user_id);
        self.store
            .set_json(&keys::token_record(token.id), &token, None)
            .await?;
        self.store
            .set(&keys::user_token(user_id), &token.id.to_string(), None)
            .await?;
        self.store
            .list_push_back(&keys::waiting_list(), &token.id.to_string())
            .await?;

        info!(user_id = %user_id, token_id = %token.id, "Token enrolled");
        Ok(token)
    }

    /// Look up a token record.
    pub async fn token(&self, token_id: TokenId) -> AppResult<AdmissionToken> {
        self.store
            .get_json(&keys::token_record(token_id))
            .await?
            .ok_or_else(|| AppError::token_not_found(format!("No token {token_id}")))
    }

    /// Verify that a token currently admits its holder to act.
    ///
    /// Booking entry points call this gate before attempting any seat
    /// operation. Fails with `TokenNotActive` for waiting or expired
    /// tokens and `TokenNotFound` for unknown ones.
    pub async fn require_active(&self, token_id: TokenId) -> AppResult<AdmissionToken> {
        let token = self.token(token_id).await?;
        if token.status != TokenStatus::Active {
            return Err(AppError::token_not_active(format!(
                "Token {token_id} is not active"
            )));
        }
        Ok(token)
    }

    /// Current status of a token, or `None` if the token is unknown.
    pub async fn status(&self, token_id: TokenId) -> AppResult<Option<TokenStatus>> {
        Ok(self
            .store
            .get_json::<AdmissionToken>(&keys::token_record(token_id))
            .await?
            .map(|t| t.status))
    }

    /// 1-based position among waiting tokens.
    ///
    /// Returns `None` for active, expired, or unknown tokens. Positions
    /// are dense and gap-free because they are derived from the list, not
    /// stored.
    pub async fn queue_position(&self, token_id: TokenId) -> AppResult<Option<u64>> {
        match self.status(token_id).await? {
            Some(TokenStatus::Waiting) => Ok(self
                .store
                .list_index_of(&keys::waiting_list(), &token_id.to_string())
                .await?
                .map(|index| index + 1)),
            _ => Ok(None),
        }
    }

    /// Informational wait estimate for a waiting token.
    pub async fn estimated_wait(&self, token_id: TokenId) -> AppResult<Option<Duration>> {
        let Some(position) = self.queue_position(token_id).await? else {
            return Ok(None);
        };
        let minutes = (position / self.config.admissions_per_minute.max(1)).max(1);
        Ok(Some(Duration::from_secs(minutes * 60)))
    }

    /// Promote waiting tokens into the active set up to free capacity.
    ///
    /// Returns the number of tokens activated. Serialized under the global
    /// drain lock so concurrent drains can never oversubscribe capacity.
    pub async fn drain(&self) -> AppResult<u64> {
        let guard = [keys::queue_drain_global()];
        self.lock
            .with_lock(&guard, &self.lock_options, || self.drain_locked())
            .await
    }

    /// The drain body; must only run under the global drain lock.
    async fn drain_locked(&self) -> AppResult<u64> {
        let active = self.store.set_len(&keys::active_set()).await?;
        let free = self.config.max_active.saturating_sub(active);
        let mut activated = 0u64;

        while activated < free {
            let Some(token_id) = self.store.list_pop_front(&keys::waiting_list()).await? else {
                break;
            };
            match self
                .store
                .get_json::<AdmissionToken>(&keys::token_record(parse_token_id(&token_id)?))
                .await?
            {
                Some(mut token) if token.status == TokenStatus::Waiting => {
                    token.activate(Utc::now());
                    self.store
                        .set_json(&keys::token_record(token.id), &token, None)
                        .await?;
                    self.store
                        .set_add(&keys::active_set(), &token_id)
                        .await?;
                    debug!(token_id = %token_id, "Token activated");
                    activated += 1;
                }
                _ => {
                    // Popped entry no longer maps to a waiting token;
                    // skip it without consuming a slot.
                    warn!(token_id = %token_id, "Dangling waiting entry skipped");
                }
            }
        }

        if activated > 0 {
            info!(activated, "Drained waiting tokens into the active set");
        }
        Ok(activated)
    }

    /// Retire a token after its booking finished, then refill the freed slot.
    ///
    /// Idempotent: completing an already-expired token is a no-op with no
    /// second drain.
    pub async fn complete(&self, token_id: TokenId) -> AppResult<()> {
        let mut token = self.token(token_id).await?;
        if token.status == TokenStatus::Expired {
            debug!(token_id = %token_id, "Token already expired, nothing to complete");
            return Ok(());
        }

        self.expire_token(&mut token).await?;
        info!(token_id = %token_id, "Token completed");

        self.drain().await?;
        Ok(())
    }

    /// Expire every active token whose activation age exceeds the TTL.
    ///
    /// Returns the expired token ids. A failure on one token is logged
    /// and does not abort the sweep of the remaining tokens.
    pub async fn reap_expired(&self) -> AppResult<Vec<TokenId>> {
        let members = self.store.set_members(&keys::active_set()).await?;
        let active_ttl = chrono::Duration::seconds(self.config.active_ttl_secs as i64);
        let now = Utc::now();
        let mut expired = Vec::new();

        for member in members {
            match self.reap_one(&member, active_ttl, now).await {
                Ok(Some(token_id)) => expired.push(token_id),
                Ok(None) => {}
                Err(e) => {
                    error!(token_id = %member, error = %e, "Failed to reap token, continuing sweep");
                }
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Reaped stale active tokens");
        }
        Ok(expired)
    }

    /// Number of currently active tokens.
    pub async fn active_count(&self) -> AppResult<u64> {
        self.store.set_len(&keys::active_set()).await
    }

    /// Number of currently waiting tokens.
    pub async fn waiting_count(&self) -> AppResult<u64> {
        self.store.list_len(&keys::waiting_list()).await
    }

    /// Examine one active-set member, expiring it when stale.
    async fn reap_one(
        &self,
        member: &str,
        active_ttl: chrono::Duration,
        now: chrono::DateTime<Utc>,
    ) -> AppResult<Option<TokenId>> {
        let token_id = parse_token_id(member)?;
        let Some(mut token) = self
            .store
            .get_json::<AdmissionToken>(&keys::token_record(token_id))
            .await?
        else {
            // Record lapsed while the set member lingered.
            warn!(token_id = %member, "Removing dangling active-set member");
            self.store.set_remove(&keys::active_set(), member).await?;
            return Ok(None);
        };

        if !token.is_stale(active_ttl, now) {
            return Ok(None);
        }

        self.expire_token(&mut token).await?;
        Ok(Some(token_id))
    }

    /// Move a token to its terminal `Expired` status and detach it from
    /// the waiting list and active set.
    ///
    /// The terminal record is rewritten with the retention TTL; live
    /// records carry none. The user index gets the same TTL when it
    /// still points at this token, so it does not outlive the record.
    async fn expire_token(&self, token: &mut AdmissionToken) -> AppResult<()> {
        let id = token.id.to_string();
        self.store.list_remove(&keys::waiting_list(), &id).await?;
        self.store.set_remove(&keys::active_set(), &id).await?;
        token.expire();
        self.store
            .set_json(&keys::token_record(token.id), token, Some(TOKEN_RECORD_TTL))
            .await?;

        let index_key = keys::user_token(token.user_id);
        if self.store.get(&index_key).await?.as_deref() == Some(id.as_str()) {
            self.store
                .set(&index_key, &id, Some(TOKEN_RECORD_TTL))
                .await?;
        }
        Ok(())
    }
}

/// Parse a stored token id back into its typed form.
fn parse_token_id(raw: &str) -> AppResult<TokenId> {
    raw.parse()
        .map_err(|_| AppError::internal(format!("Malformed token id in store: {raw}")))
}
