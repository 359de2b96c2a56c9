//! Store error types.

use thiserror::Error;
use vicinity_core::{TransportError, UserId};
use vicinity_lock::LockError;
use vicinity_space::SpaceError;

/// Failure of a store operation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StoreError {
    /// Coordinate or region-path encoding failed.
    #[error(transparent)]
    Space(#[from] SpaceError),
    /// The user has no recorded position on this replica.
    #[error("user '{user}' does not exist")]
    UnknownUser {
        /// The missing user.
        user: UserId,
    },
    /// The distributed lock around the shared snapshot failed.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// The shared blob store failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A snapshot could not be encoded or decoded, or decoded to an
    /// inconsistent state.
    #[error("snapshot: {reason}")]
    Snapshot {
        /// What went wrong.
        reason: String,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot {
            reason: e.to_string(),
        }
    }
}
