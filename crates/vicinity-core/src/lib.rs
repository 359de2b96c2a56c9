//! Core types and traits for the Vicinity proximity service.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Vicinity workspace:
//! user identifiers, wall-clock timestamps, the [`Clock`] seam used for
//! deterministic testing, and the traits through which the core talks to
//! its external collaborators (the shared [`BlobStore`] and the
//! [`LeaseService`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod error;
pub mod id;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::TransportError;
pub use id::UserId;
pub use traits::{BlobStore, Lease, LeaseService};

/// Join key segments with `:` the way every shared-store key is laid out.
///
/// ```
/// assert_eq!(vicinity_core::format_key(&["location", "stage", "eu-1"]), "location:stage:eu-1");
/// ```
pub fn format_key(parts: &[&str]) -> String {
    parts.join(":")
}
