//! Lock error types.

use std::time::Duration;

use thiserror::Error;
use vicinity_core::TransportError;

/// Failure of a lock operation.
///
/// Contention is never an error: [`lock`](crate::DistributedLock::lock)
/// retries internally until it wins, times out, or is cancelled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LockError {
    /// `max_wait` elapsed before the lease could be obtained.
    #[error("timed out after {waited:?} waiting for lock on '{resource}'")]
    Timeout {
        /// The contended resource.
        resource: String,
        /// How long the caller waited.
        waited: Duration,
    },
    /// The caller's [`Cancellation`](crate::Cancellation) fired while waiting.
    #[error("cancelled while waiting for lock on '{resource}'")]
    Cancelled {
        /// The contended resource.
        resource: String,
    },
    /// `unlock` was called for a resource this instance does not hold.
    #[error("lock on '{resource}' is not held by this instance")]
    NotHeld {
        /// The resource named in the unlock.
        resource: String,
    },
    /// The lease service failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
