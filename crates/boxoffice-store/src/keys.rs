//! Key and channel builders for every coordination entry in the store.
//!
//! Centralising key construction prevents typos and keeps unrelated
//! operations from ever colliding on a key. Business-layer operations
//! (payment, balance) lock through the same namespace, so their builders
//! live here too.

use boxoffice_core::types::id::{ReservationId, SeatId, TokenId, UserId};

// ── Lock keys ──────────────────────────────────────────────

/// Lock key guarding all state transitions of a seat.
pub fn seat_op(seat_id: SeatId) -> String {
    format!("seat:op:{seat_id}")
}

/// Lock key guarding confirmation of a reservation.
pub fn reservation_confirm(id: ReservationId) -> String {
    format!("reservation:confirm:{id}")
}

/// Lock key guarding cancellation of a reservation.
pub fn reservation_cancel(id: ReservationId) -> String {
    format!("reservation:cancel:{id}")
}

/// Lock key guarding payment processing for a reservation.
pub fn payment_process(user_id: UserId, reservation_id: ReservationId) -> String {
    format!("payment:process:{user_id}:{reservation_id}")
}

/// Lock key guarding balance mutation for a user.
pub fn user_balance(user_id: UserId) -> String {
    format!("user:balance:{user_id}")
}

/// Lock key guarding activation of a single token.
pub fn token_activate(token_id: TokenId) -> String {
    format!("token:activate:{token_id}")
}

/// Lock key serializing enrollment for a single user.
pub fn token_enroll(user_id: UserId) -> String {
    format!("token:enroll:{user_id}")
}

/// Lock key serializing the admission queue's drain.
pub fn queue_drain_global() -> String {
    "queue:process:global".to_string()
}

// ── Notification channels ──────────────────────────────────

/// Channel on which a lock key's release is announced.
pub fn release_channel(lock_key: &str) -> String {
    format!("lock:release:{lock_key}")
}

// ── Queue data keys ────────────────────────────────────────

/// Key of the JSON record for an admission token.
pub fn token_record(token_id: TokenId) -> String {
    format!("token:record:{token_id}")
}

/// Key mapping a user to their current live token.
pub fn user_token(user_id: UserId) -> String {
    format!("token:user:{user_id}")
}

/// Key of the FIFO waiting list of token ids.
pub fn waiting_list() -> String {
    "queue:waiting".to_string()
}

/// Key of the set of currently active token ids.
pub fn active_set() -> String {
    "queue:active".to_string()
}
