//! Reconciliation through the shared snapshot slot.

use std::sync::Arc;

use tracing::{debug, info};
use vicinity_core::{format_key, BlobStore};
use vicinity_lock::{Cancellation, DistributedLock};

use crate::error::StoreError;
use crate::merge::MergeStats;
use crate::store::ReplicaStore;

/// Key prefix of every replica group's shared snapshot.
pub const STATE_PREFIX: &str = "location:stage";

/// What one [`sync`](ReplicaStore::sync) did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Merge counters, or `None` if there was no shared snapshot yet.
    pub merged: Option<MergeStats>,
    /// Size of the snapshot published.
    pub published_bytes: usize,
}

impl ReplicaStore {
    /// The shared snapshot key (and lock resource) for this store's group.
    pub fn state_key(&self) -> String {
        format_key(&[STATE_PREFIX, &self.config.replica_group])
    }

    /// Reconcile with the group's shared snapshot.
    ///
    /// Under the distributed lock on [`state_key`](Self::state_key): fetch
    /// the shared snapshot, merge it with this store (both directions), and
    /// publish the merged state back. With no snapshot yet, just publish.
    ///
    /// The store's own lock is only held while merging and serializing,
    /// never across blob-store I/O. The distributed lock is released on
    /// every path, marked processed only on success. Transport and decode
    /// failures are returned, never masked.
    pub fn sync(
        &self,
        blobs: &dyn BlobStore,
        lock: &DistributedLock,
    ) -> Result<SyncOutcome, StoreError> {
        self.sync_inner(blobs, lock, None)
    }

    /// Like [`sync`](Self::sync), but gives up waiting for the distributed
    /// lock once `cancel` fires, returning
    /// [`LockError::Cancelled`](vicinity_lock::LockError::Cancelled).
    /// Once the lock is held the sync runs to completion.
    pub fn sync_with_cancel(
        &self,
        blobs: &dyn BlobStore,
        lock: &DistributedLock,
        cancel: &Cancellation,
    ) -> Result<SyncOutcome, StoreError> {
        self.sync_inner(blobs, lock, Some(cancel))
    }

    fn sync_inner(
        &self,
        blobs: &dyn BlobStore,
        lock: &DistributedLock,
        cancel: Option<&Cancellation>,
    ) -> Result<SyncOutcome, StoreError> {
        let key = self.state_key();
        match cancel {
            Some(cancel) => lock.lock_with_cancel(&key, cancel)?,
            None => lock.lock(&key)?,
        }
        let result = self.sync_locked(&key, blobs);
        let unlocked = lock.unlock(&key, result.is_ok());
        let outcome = result?;
        unlocked?;
        info!(
            key = %key,
            merged = outcome.merged.is_some(),
            bytes = outcome.published_bytes,
            "sync complete"
        );
        Ok(outcome)
    }

    fn sync_locked(&self, key: &str, blobs: &dyn BlobStore) -> Result<SyncOutcome, StoreError> {
        let merged = match blobs.get(key)? {
            Some(bytes) => {
                let shared = ReplicaStore::from_json(
                    self.config.clone(),
                    self.index.clone(),
                    Arc::clone(&self.clock),
                    &bytes,
                )?;
                Some(self.merge(&shared))
            }
            None => {
                debug!(key, "no shared snapshot yet");
                None
            }
        };
        let bytes = self.to_json()?;
        blobs.set(key, &bytes)?;
        Ok(SyncOutcome {
            merged,
            published_bytes: bytes.len(),
        })
    }
}
