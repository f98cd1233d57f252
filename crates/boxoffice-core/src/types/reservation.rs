//! Seat state and reservation domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{ReservationId, SeatId, UserId};

/// State of a single seat.
///
/// Transitions: `Available → Held → Confirmed` (happy path) or
/// `Available → Held → Available` (cancelled or expired hold).
/// `Confirmed` is terminal for that booking attempt. All transitions
/// happen while the coordinator holds the seat's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    /// The seat can be held.
    Available,
    /// A temporary hold exists; it lapses at `expires_at`.
    Held {
        /// When the hold lapses.
        expires_at: DateTime<Utc>,
    },
    /// The booking completed; the seat is sold.
    Confirmed,
    /// The seat is not sellable (blocked, broken, withheld).
    Unavailable,
}

impl SeatState {
    /// Whether a `Held` state has lapsed as of `now`.
    pub fn is_expired_hold(&self, now: DateTime<Utc>) -> bool {
        matches!(self, Self::Held { expires_at } if *expires_at <= now)
    }
}

/// A reservation record, present only while its seat is `Held` or `Confirmed`.
///
/// At most one reservation is associated with a seat at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation identifier.
    pub id: ReservationId,
    /// The seat this reservation holds.
    pub seat_id: SeatId,
    /// The caller that placed the hold.
    pub user_id: UserId,
    /// When the hold lapses unless confirmed.
    pub expires_at: DateTime<Utc>,
    /// Set once the reservation is confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Create a new hold reservation lapsing at `expires_at`.
    pub fn hold(seat_id: SeatId, user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: ReservationId::new(),
            seat_id,
            user_id,
            expires_at,
            confirmed_at: None,
        }
    }

    /// Whether the hold has lapsed as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.confirmed_at.is_none() && self.expires_at <= now
    }

    /// Whether the reservation has been confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_held_state_expiry() {
        let now = Utc::now();
        let held = SeatState::Held {
            expires_at: now + Duration::minutes(5),
        };
        assert!(!held.is_expired_hold(now));
        assert!(held.is_expired_hold(now + Duration::minutes(6)));
        assert!(!SeatState::Available.is_expired_hold(now));
    }

    #[test]
    fn test_reservation_expiry_ignores_confirmed() {
        let now = Utc::now();
        let mut reservation = Reservation::hold(SeatId::new(), UserId::new(), now);
        assert!(reservation.is_expired(now));

        reservation.confirmed_at = Some(now);
        assert!(!reservation.is_expired(now + Duration::hours(1)));
        assert!(reservation.is_confirmed());
    }

    #[test]
    fn test_seat_state_serde_tagging() {
        let state = SeatState::Held {
            expires_at: Utc::now(),
        };
        let json = serde_json::to_string(&state).expect("serialize");
        assert!(json.contains("\"HELD\""));
        let parsed: SeatState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, state);
    }
}
