//! Error types shared by every collaborator-facing crate.

use thiserror::Error;

/// Failure talking to an external collaborator (blob store or lease service).
///
/// "Not found" and "busy" are not errors: they are modelled as `Ok(None)`
/// by [`BlobStore::get`](crate::BlobStore::get) and
/// [`LeaseService::obtain`](crate::LeaseService::obtain). Anything that
/// reaches this type is propagated to the caller, never masked.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend could not be reached or refused the request.
    #[error("backend unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },
    /// A release was attempted with a token that no longer owns the lease,
    /// usually because it expired and someone else obtained it.
    #[error("lease on '{resource}' is no longer held by this token")]
    LeaseLost {
        /// The resource whose lease was lost.
        resource: String,
    },
    /// Any other backend failure.
    #[error("transport failure: {reason}")]
    Other {
        /// What went wrong.
        reason: String,
    },
}
