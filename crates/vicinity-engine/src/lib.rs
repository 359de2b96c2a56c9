//! Runtime services for Vicinity replicas.
//!
//! Two pieces run alongside a [`ReplicaStore`](vicinity_store::ReplicaStore):
//!
//! - [`ReconciliationLoop`]: a background thread that periodically syncs
//!   the store with its replica group's shared snapshot.
//! - [`MessageHandler`]: applies broker messages (position reports and
//!   nearby requests) to the store, at most once per message id.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vicinity_core::SystemClock;
//! use vicinity_engine::{HandlerConfig, MessageHandler, ReconcileConfig, ReconciliationLoop};
//! use vicinity_lock::{DistributedLock, LockConfig, MemoryLeaseService};
//! use vicinity_space::{IndexConfig, SpatialIndex};
//! use vicinity_store::{MemoryBlobStore, ReplicaStore, StoreConfig};
//!
//! let index = SpatialIndex::new(IndexConfig::default()).unwrap();
//! let store = Arc::new(
//!     ReplicaStore::new(StoreConfig::default(), index, Arc::new(SystemClock)).unwrap(),
//! );
//! let lock = Arc::new(
//!     DistributedLock::new(Arc::new(MemoryLeaseService::new()), LockConfig::default()).unwrap(),
//! );
//! let _sync = ReconciliationLoop::spawn(
//!     Arc::clone(&store),
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::clone(&lock),
//!     ReconcileConfig::default(),
//! )
//! .unwrap();
//!
//! let handler = Arc::new(MessageHandler::new(store, lock, HandlerConfig::default()).unwrap());
//! let (in_tx, in_rx) = crossbeam_channel::unbounded();
//! let (out_tx, out_rx) = crossbeam_channel::unbounded();
//! let worker = handler.spawn_worker(in_rx, out_tx).unwrap();
//! # drop((in_tx, out_rx, worker));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod handler;
pub mod message;
pub mod reconcile;

pub use config::{ConfigError, HandlerConfig, ReconcileConfig};
pub use handler::{Handled, MessageHandler, WorkerReport};
pub use message::{InboundMessage, Message, MessageKind, OutboundMessage, UnknownKind};
pub use reconcile::{ReconcileReport, ReconciliationLoop};
