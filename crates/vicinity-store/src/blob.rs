//! In-process blob store.

use std::collections::HashMap;

use parking_lot::RwLock;
use vicinity_core::{BlobStore, TransportError};

/// A [`BlobStore`] held in memory.
///
/// Lets several replicas in one process reconcile without an external
/// key/value server. Share it via `Arc<MemoryBlobStore>`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), TransportError> {
        self.blobs.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
