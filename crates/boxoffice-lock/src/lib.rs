//! # boxoffice-lock
//!
//! Distributed mutual exclusion over the coordination store. One
//! acquisition routine, three wait policies (fail fast, poll, block on
//! release notification), and a scoped `with_lock` API that makes the
//! guarded region and its keys visible at the call site.

mod lock;
mod options;

pub use lock::DistributedLock;
pub use options::{LockOptions, LockStrategy};
