//! Vicinity: a replicated geospatial proximity index.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Vicinity sub-crates. For most users, adding `vicinity` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use vicinity::prelude::*;
//!
//! let index = SpatialIndex::new(IndexConfig::default()).unwrap();
//! let store = ReplicaStore::new(StoreConfig::default(), index, Arc::new(SystemClock)).unwrap();
//!
//! store.upsert(&UserId::from("alice"), 20.0, -60.0).unwrap();
//! store.upsert(&UserId::from("bob"), 20.0, -60.0).unwrap();
//! assert_eq!(store.nearby(&UserId::from("alice"), 0).unwrap(), vec![UserId::from("bob")]);
//!
//! // Publish to the group's shared slot under the distributed lock.
//! let blobs = MemoryBlobStore::new();
//! let lock = DistributedLock::new(Arc::new(MemoryLeaseService::new()), LockConfig::default())
//!     .unwrap();
//! store.sync(&blobs, &lock).unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vicinity-core` | IDs, timestamps, clocks, collaborator traits |
//! | [`space`] | `vicinity-space` | Quadtree partitioning of latitude/longitude |
//! | [`lock`] | `vicinity-lock` | Lease-based distributed lock with processed markers |
//! | [`store`] | `vicinity-store` | Replicated position store, merge, and sync |
//! | [`engine`] | `vicinity-engine` | Reconciliation loop and message handling |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and collaborator traits (`vicinity-core`).
///
/// Implement [`types::BlobStore`] and [`types::LeaseService`] to plug in
/// an external key/value server.
pub use vicinity_core as types;

/// Quadtree partitioning of the globe (`vicinity-space`).
///
/// [`space::SpatialIndex`] maps coordinates to [`space::Partition`]s and
/// answers neighbourhood queries.
pub use vicinity_space as space;

/// Distributed mutual exclusion (`vicinity-lock`).
pub use vicinity_lock as lock;

/// Replicated position store (`vicinity-store`).
///
/// [`store::ReplicaStore`] holds positions with last-write-wins
/// semantics and reconciles with peers via [`store::ReplicaStore::sync`].
pub use vicinity_store as store;

/// Runtime services (`vicinity-engine`).
///
/// [`engine::ReconciliationLoop`] for periodic background sync,
/// [`engine::MessageHandler`] for broker message processing.
pub use vicinity_engine as engine;

/// Common imports for typical Vicinity usage.
///
/// ```rust
/// use vicinity::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use vicinity_core::{BlobStore, Clock, LeaseService, SystemClock, Timestamp, UserId};

    // Errors
    pub use vicinity_core::TransportError;
    pub use vicinity_lock::LockError;
    pub use vicinity_space::SpaceError;
    pub use vicinity_store::StoreError;

    // Space
    pub use vicinity_space::{EdgeBehavior, GeoBounds, IndexConfig, Partition, SpatialIndex};

    // Lock
    pub use vicinity_lock::{DistributedLock, LockConfig, MemoryLeaseService};

    // Store
    pub use vicinity_store::{MemoryBlobStore, ReplicaStore, StoreConfig, UserData};

    // Engine
    pub use vicinity_engine::{
        HandlerConfig, Message, MessageHandler, MessageKind, ReconcileConfig, ReconciliationLoop,
    };
}
