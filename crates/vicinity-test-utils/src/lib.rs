//! Test utilities and mock collaborators for Vicinity development.
//!
//! Provides scriptable implementations of the collaborator traits
//! ([`BlobStore`], [`LeaseService`]) so tests can inject transport
//! failures and count round trips, plus shared scenario [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use vicinity_core::{BlobStore, Lease, LeaseService, TransportError};

/// In-memory [`BlobStore`] whose reads and writes can be switched to fail.
///
/// Counts every call, including failed ones, so tests can assert how many
/// round trips an operation made.
#[derive(Default)]
pub struct MockBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail with `Unavailable`.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` fail with `Unavailable`.
    pub fn fail_sets(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Store raw bytes directly, bypassing failure injection.
    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.blobs.lock().insert(key.to_string(), value.to_vec());
    }

    /// Read raw bytes directly, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(key).cloned()
    }
}

impl BlobStore for MockBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable {
                reason: format!("injected get failure for '{key}'"),
            });
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), TransportError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable {
                reason: format!("injected set failure for '{key}'"),
            });
        }
        self.put_raw(key, value);
        Ok(())
    }
}

/// A [`LeaseService`] whose backend is always down.
#[derive(Debug, Default)]
pub struct FailingLeaseService;

impl FailingLeaseService {
    fn down() -> TransportError {
        TransportError::Unavailable {
            reason: "lease service down".to_string(),
        }
    }
}

impl LeaseService for FailingLeaseService {
    fn obtain(&self, _resource: &str, _ttl: Duration) -> Result<Option<Lease>, TransportError> {
        Err(Self::down())
    }

    fn release(&self, _lease: &Lease) -> Result<(), TransportError> {
        Err(Self::down())
    }

    fn exists(&self, _key: &str) -> Result<bool, TransportError> {
        Err(Self::down())
    }

    fn set_marker(&self, _key: &str, _ttl: Duration) -> Result<(), TransportError> {
        Err(Self::down())
    }

    fn wait_release(&self, _resource: &str, _timeout: Duration) {}
}

/// A [`LeaseService`] that grants every lease and remembers nothing,
/// except that setting markers fails.
///
/// Exercises the "marker write failed after the work was done" path.
#[derive(Debug, Default)]
pub struct MarkerFailingLeaseService {
    releases: AtomicUsize,
}

impl MarkerFailingLeaseService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl LeaseService for MarkerFailingLeaseService {
    fn obtain(&self, resource: &str, _ttl: Duration) -> Result<Option<Lease>, TransportError> {
        Ok(Some(Lease {
            resource: resource.to_string(),
            token: "mock".to_string(),
        }))
    }

    fn release(&self, _lease: &Lease) -> Result<(), TransportError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exists(&self, _key: &str) -> Result<bool, TransportError> {
        Ok(false)
    }

    fn set_marker(&self, key: &str, _ttl: Duration) -> Result<(), TransportError> {
        Err(TransportError::Other {
            reason: format!("injected marker failure for '{key}'"),
        })
    }
}
