//! Admission token domain type.
//!
//! An admission token is the ticket a caller must hold before it may
//! attempt any booking operation. Tokens gate load on the booking path
//! independently of seat-level locking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{TokenId, UserId};

/// Lifecycle status of an admission token.
///
/// `Expired` is terminal; no transition returns a token to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    /// Queued, not yet eligible to act.
    Waiting,
    /// Admitted into the active set; the holder may attempt booking operations.
    Active,
    /// Retired, either by completion or by the reaper.
    Expired,
}

/// An admission token owned by exactly one caller session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionToken {
    /// Token identifier (opaque to callers).
    pub id: TokenId,
    /// The user this token admits.
    pub user_id: UserId,
    /// Current lifecycle status.
    pub status: TokenStatus,
    /// When the token was enrolled into the waiting queue.
    pub enrolled_at: DateTime<Utc>,
    /// When the token was activated, if it ever was.
    pub activated_at: Option<DateTime<Utc>>,
}

impl AdmissionToken {
    /// Create a fresh token in `Waiting` status for the given user.
    pub fn enroll(user_id: UserId) -> Self {
        Self {
            id: TokenId::new(),
            user_id,
            status: TokenStatus::Waiting,
            enrolled_at: Utc::now(),
            activated_at: None,
        }
    }

    /// Whether this token is live (not yet expired).
    pub fn is_live(&self) -> bool {
        self.status != TokenStatus::Expired
    }

    /// Whether an active token has outlived the given TTL.
    ///
    /// A token that was never activated cannot be stale by this measure.
    pub fn is_stale(&self, active_ttl: Duration, now: DateTime<Utc>) -> bool {
        match (self.status, self.activated_at) {
            (TokenStatus::Active, Some(activated_at)) => now - activated_at > active_ttl,
            _ => false,
        }
    }

    /// Transition to `Active`, recording the activation timestamp.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.status = TokenStatus::Active;
        self.activated_at = Some(now);
    }

    /// Transition to the terminal `Expired` status.
    pub fn expire(&mut self) {
        self.status = TokenStatus::Expired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enroll_starts_waiting() {
        let token = AdmissionToken::enroll(UserId::new());
        assert_eq!(token.status, TokenStatus::Waiting);
        assert!(token.activated_at.is_none());
        assert!(token.is_live());
    }

    #[test]
    fn test_activate_records_timestamp() {
        let mut token = AdmissionToken::enroll(UserId::new());
        let now = Utc::now();
        token.activate(now);
        assert_eq!(token.status, TokenStatus::Active);
        assert_eq!(token.activated_at, Some(now));
    }

    #[test]
    fn test_stale_only_when_active_past_ttl() {
        let mut token = AdmissionToken::enroll(UserId::new());
        let ttl = Duration::minutes(10);
        let now = Utc::now();
        assert!(!token.is_stale(ttl, now));

        token.activate(now);
        assert!(!token.is_stale(ttl, now + Duration::minutes(5)));
        assert!(token.is_stale(ttl, now + Duration::minutes(11)));

        token.expire();
        assert!(!token.is_stale(ttl, now + Duration::minutes(11)));
    }

    #[test]
    fn test_expired_is_terminal_status() {
        let mut token = AdmissionToken::enroll(UserId::new());
        token.expire();
        assert!(!token.is_live());
    }
}
