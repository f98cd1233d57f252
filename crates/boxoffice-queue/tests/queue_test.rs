//! Integration tests for the admission queue against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use boxoffice_core::config::queue::QueueConfig;
use boxoffice_core::error::ErrorKind;
use boxoffice_core::traits::store::LockStore;
use boxoffice_core::types::id::{TokenId, UserId};
use boxoffice_core::types::token::TokenStatus;
use boxoffice_lock::DistributedLock;
use boxoffice_queue::AdmissionQueue;
use boxoffice_store::{MemoryLockStore, StoreManager, keys};

fn queue_with(config: QueueConfig) -> AdmissionQueue {
    let (_, queue) = store_and_queue(config);
    queue
}

fn store_and_queue(config: QueueConfig) -> (StoreManager, AdmissionQueue) {
    let store = StoreManager::from_store(Arc::new(MemoryLockStore::new()));
    let lock = DistributedLock::new(store.clone());
    let queue = AdmissionQueue::new(store.clone(), lock, config);
    (store, queue)
}

fn config(max_active: u64) -> QueueConfig {
    QueueConfig {
        max_active,
        active_ttl_secs: 600,
        admissions_per_minute: 60,
    }
}

#[tokio::test]
async fn test_fifo_admission_order() {
    let queue = queue_with(config(3));

    let mut tokens = Vec::new();
    for _ in 0..5 {
        tokens.push(queue.enroll(UserId::new()).await.unwrap());
    }

    let activated = queue.drain().await.unwrap();
    assert_eq!(activated, 3);

    // The first three enrolled are active, in enrollment order.
    for token in &tokens[..3] {
        assert_eq!(
            queue.status(token.id).await.unwrap(),
            Some(TokenStatus::Active)
        );
        assert_eq!(queue.queue_position(token.id).await.unwrap(), None);
    }

    // The rest are waiting with dense 1-based positions.
    assert_eq!(queue.queue_position(tokens[3].id).await.unwrap(), Some(1));
    assert_eq!(queue.queue_position(tokens[4].id).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_capacity_bound_with_overflow() {
    let queue = queue_with(config(100));

    let mut tokens = Vec::new();
    for _ in 0..150 {
        tokens.push(queue.enroll(UserId::new()).await.unwrap());
    }

    queue.drain().await.unwrap();

    assert_eq!(queue.active_count().await.unwrap(), 100);
    assert_eq!(queue.waiting_count().await.unwrap(), 50);

    // Remaining tokens report positions 1..=50, dense and gap-free.
    for (offset, token) in tokens[100..].iter().enumerate() {
        assert_eq!(
            queue.queue_position(token.id).await.unwrap(),
            Some(offset as u64 + 1)
        );
    }

    // A second drain has nothing to admit.
    assert_eq!(queue.drain().await.unwrap(), 0);
    assert_eq!(queue.active_count().await.unwrap(), 100);
}

#[tokio::test]
async fn test_complete_frees_slot_and_admits_next() {
    let queue = queue_with(config(1));

    let first = queue.enroll(UserId::new()).await.unwrap();
    let second = queue.enroll(UserId::new()).await.unwrap();
    queue.drain().await.unwrap();

    assert_eq!(
        queue.status(first.id).await.unwrap(),
        Some(TokenStatus::Active)
    );
    assert_eq!(queue.queue_position(second.id).await.unwrap(), Some(1));

    queue.complete(first.id).await.unwrap();

    // Completion drains immediately; the waiter is admitted without a tick.
    assert_eq!(
        queue.status(first.id).await.unwrap(),
        Some(TokenStatus::Expired)
    );
    assert_eq!(
        queue.status(second.id).await.unwrap(),
        Some(TokenStatus::Active)
    );
    assert_eq!(queue.active_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let queue = queue_with(config(1));

    let token = queue.enroll(UserId::new()).await.unwrap();
    queue.drain().await.unwrap();

    queue.complete(token.id).await.unwrap();
    // Second completion: no error, no double-drain side effects.
    queue.complete(token.id).await.unwrap();

    assert_eq!(
        queue.status(token.id).await.unwrap(),
        Some(TokenStatus::Expired)
    );
    assert_eq!(queue.active_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reenroll_invalidates_prior_token() {
    let queue = queue_with(config(10));
    let user = UserId::new();

    let first = queue.enroll(user).await.unwrap();
    let second = queue.enroll(user).await.unwrap();
    assert_ne!(first.id, second.id);

    assert_eq!(
        queue.status(first.id).await.unwrap(),
        Some(TokenStatus::Expired)
    );
    assert_eq!(
        queue.status(second.id).await.unwrap(),
        Some(TokenStatus::Waiting)
    );
    // The expired token no longer occupies a queue slot.
    assert_eq!(queue.waiting_count().await.unwrap(), 1);
    assert_eq!(queue.queue_position(second.id).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_reap_expires_only_overdue_tokens() {
    // TTL of zero makes every activated token immediately stale.
    let queue = queue_with(QueueConfig {
        max_active: 1,
        active_ttl_secs: 0,
        admissions_per_minute: 60,
    });

    let active = queue.enroll(UserId::new()).await.unwrap();
    let waiting = queue.enroll(UserId::new()).await.unwrap();
    queue.drain().await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    let reaped = queue.reap_expired().await.unwrap();

    assert_eq!(reaped, vec![active.id]);
    assert_eq!(
        queue.status(active.id).await.unwrap(),
        Some(TokenStatus::Expired)
    );
    // The waiting token was never activated, so the reaper leaves it alone.
    assert_eq!(
        queue.status(waiting.id).await.unwrap(),
        Some(TokenStatus::Waiting)
    );
    assert_eq!(queue.active_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_require_active_gates_booking_attempts() {
    let queue = queue_with(config(1));

    let admitted = queue.enroll(UserId::new()).await.unwrap();
    let waiting = queue.enroll(UserId::new()).await.unwrap();
    queue.drain().await.unwrap();

    assert_eq!(
        queue.require_active(admitted.id).await.unwrap().id,
        admitted.id
    );

    let err = queue.require_active(waiting.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenNotActive);

    queue.complete(admitted.id).await.unwrap();
    let err = queue.require_active(admitted.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenNotActive);

    let err = queue
        .require_active(boxoffice_core::types::id::TokenId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenNotFound);
}

#[tokio::test]
async fn test_position_sentinel_for_unknown_token() {
    let queue = queue_with(config(10));
    let unknown = boxoffice_core::types::id::TokenId::new();
    assert_eq!(queue.queue_position(unknown).await.unwrap(), None);
    assert_eq!(queue.status(unknown).await.unwrap(), None);
}

#[tokio::test]
async fn test_estimated_wait_floor_is_one_minute() {
    let queue = queue_with(config(10));
    let token = queue.enroll(UserId::new()).await.unwrap();

    // Position 1 at 60 admissions/minute still reports the floor.
    assert_eq!(
        queue.estimated_wait(token.id).await.unwrap(),
        Some(Duration::from_secs(60))
    );

    queue.drain().await.unwrap();
    // Active tokens have no wait estimate.
    assert_eq!(queue.estimated_wait(token.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_drain_skips_dangling_entry_without_losing_slot() {
    let (store, queue) = store_and_queue(config(1));

    // A list entry whose record is gone, ahead of a real waiter.
    store
        .list_push_back(&keys::waiting_list(), &TokenId::new().to_string())
        .await
        .unwrap();
    let token = queue.enroll(UserId::new()).await.unwrap();

    // The dangling entry is discarded and the real waiter still takes
    // the one free slot in the same drain.
    assert_eq!(queue.drain().await.unwrap(), 1);
    assert_eq!(
        queue.status(token.id).await.unwrap(),
        Some(TokenStatus::Active)
    );
    assert_eq!(queue.waiting_count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_enrolls_leave_one_live_token() {
    let queue = queue_with(config(10));
    let user = UserId::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move { queue.enroll(user).await }));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap().unwrap());
    }

    // Exactly one of the issued tokens is still live.
    let mut live = 0;
    for token in &tokens {
        if queue.status(token.id).await.unwrap() == Some(TokenStatus::Waiting) {
            live += 1;
        }
    }
    assert_eq!(live, 1);
    assert_eq!(queue.waiting_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_drains_never_oversubscribe() {
    let queue = queue_with(config(5));

    for _ in 0..20 {
        queue.enroll(UserId::new()).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move { queue.drain().await }));
    }

    let mut total_activated = 0;
    for handle in handles {
        total_activated += handle.await.unwrap().unwrap();
    }

    assert_eq!(total_activated, 5);
    assert_eq!(queue.active_count().await.unwrap(), 5);
    assert_eq!(queue.waiting_count().await.unwrap(), 15);
}
