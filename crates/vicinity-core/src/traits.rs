//! Traits for the external collaborators the core consumes.
//!
//! The broker transports, the Redis client, and the lease backend live
//! outside this workspace. The core only sees them through these two
//! traits, which keeps the reconciliation and locking logic testable with
//! in-process implementations.

use std::time::Duration;

use crate::error::TransportError;

/// Shared key/value blob store backing the reconciliation snapshot.
pub trait BlobStore: Send + Sync {
    /// Fetch the value under `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), TransportError>;
}

/// A time-bounded exclusive claim on a resource id.
///
/// The token identifies the holder so that a release from a stale holder
/// (whose lease already expired and was reclaimed) cannot free someone
/// else's lease.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    /// The leased resource id.
    pub resource: String,
    /// Opaque holder token issued by the lease service.
    pub token: String,
}

/// Shared lease service backing `DistributedLock`.
///
/// Implementations must guarantee that at most one unexpired lease exists
/// per resource id across every process talking to the service.
pub trait LeaseService: Send + Sync {
    /// Try to obtain a lease on `resource` for `ttl`.
    ///
    /// Returns `Ok(None)` if another holder owns an unexpired lease.
    fn obtain(&self, resource: &str, ttl: Duration) -> Result<Option<Lease>, TransportError>;

    /// Release a lease previously returned by [`obtain`](Self::obtain).
    fn release(&self, lease: &Lease) -> Result<(), TransportError>;

    /// Whether a marker key currently exists.
    fn exists(&self, key: &str) -> Result<bool, TransportError>;

    /// Set a marker key that expires after `ttl`.
    fn set_marker(&self, key: &str, ttl: Duration) -> Result<(), TransportError>;

    /// Time left on the current lease for `resource`, if one is held.
    ///
    /// Used to arm the retry timer so a waiter never sleeps past the
    /// point where a crashed holder's lease self-heals. Backends that
    /// cannot report this return `Ok(None)`.
    fn remaining_ttl(&self, _resource: &str) -> Result<Option<Duration>, TransportError> {
        Ok(None)
    }

    /// Block for at most `timeout`, returning early if the lease on
    /// `resource` is released.
    ///
    /// Spurious early returns are allowed; callers always retry
    /// [`obtain`](Self::obtain). The default has no notification source
    /// and simply sleeps, which degrades to fixed-interval retry.
    fn wait_release(&self, _resource: &str, timeout: Duration) {
        std::thread::sleep(timeout);
    }
}
