//! Distributed mutual exclusion for Vicinity.
//!
//! A [`DistributedLock`] serializes access to a named resource across
//! processes by holding a time-bounded lease from a shared
//! [`LeaseService`](vicinity_core::LeaseService). Leases expire on their
//! own, so a crashed holder never wedges the resource for longer than the
//! lease TTL.
//!
//! Unlocking can also leave behind a "processed" marker for the resource,
//! which turns the lock into an at-most-once gate for message handling:
//! lock, check [`DistributedLock::is_processed`], do the work, then unlock
//! with `processed = true`.
//!
//! [`MemoryLeaseService`] is an in-process lease backend for tests and
//! single-process deployments.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod lock;
pub mod memory;

pub use cancel::Cancellation;
pub use config::{ConfigError, LockConfig};
pub use error::LockError;
pub use lock::{marker_key, DistributedLock, LockGuard};
pub use memory::MemoryLeaseService;
