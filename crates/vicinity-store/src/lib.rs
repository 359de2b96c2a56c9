//! Replicated position storage for Vicinity.
//!
//! A [`ReplicaStore`] is one process's last-write-wins table of user
//! positions, bucketed by region so that proximity queries only touch the
//! regions a [`SpatialIndex`](vicinity_space::SpatialIndex) says are nearby.
//!
//! # Reconciliation
//!
//! Replicas never talk to each other directly. Each accepted mutation is
//! logged as an [`Event`]; [`ReplicaStore::merge`] replays two logs
//! newest-first so both sides agree, and [`ReplicaStore::sync`] does that
//! against a [`Snapshot`] kept in a shared
//! [`BlobStore`](vicinity_core::BlobStore) under a
//! [`DistributedLock`](vicinity_lock::DistributedLock). Upserts older than
//! the store's TTL are dropped rather than merged, so a replica that falls
//! behind loses stale positions instead of resurrecting them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod blob;
pub mod config;
pub mod error;
pub mod merge;
pub mod record;
pub(crate) mod replica;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use blob::MemoryBlobStore;
pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use merge::MergeStats;
pub use record::{Event, EventKind, UserData};
pub use snapshot::Snapshot;
pub use store::ReplicaStore;
pub use sync::{SyncOutcome, STATE_PREFIX};
