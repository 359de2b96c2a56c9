//! Position records and log events.

use serde::{Deserialize, Serialize};
use vicinity_core::{Timestamp, UserId};

/// A user's last known position and when it was written.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub long: f64,
    /// Writer's wall-clock time. The only tie-breaker between replicas.
    pub timestamp: Timestamp,
}

/// What an [`Event`] did.
///
/// Upserts carry the position they wrote so a merge can replay them
/// without consulting either side's current record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EventKind {
    /// The user moved to `(lat, long)`.
    Upsert {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        long: f64,
    },
    /// The user was removed.
    Remove,
}

/// One entry in a replica's event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Whose record changed.
    pub user: UserId,
    /// The change.
    #[serde(flatten)]
    pub kind: EventKind,
    /// When it happened.
    pub timestamp: Timestamp,
}

impl Event {
    /// An upsert of `user` to `(lat, long)` at `timestamp`.
    pub fn upsert(user: UserId, lat: f64, long: f64, timestamp: Timestamp) -> Self {
        Self {
            user,
            kind: EventKind::Upsert { lat, long },
            timestamp,
        }
    }

    /// A removal of `user` at `timestamp`.
    pub fn remove(user: UserId, timestamp: Timestamp) -> Self {
        Self {
            user,
            kind: EventKind::Remove,
            timestamp,
        }
    }

    /// The record this event writes, if it is an upsert.
    pub fn record(&self) -> Option<UserData> {
        match self.kind {
            EventKind::Upsert { lat, long } => Some(UserData {
                lat,
                long,
                timestamp: self.timestamp,
            }),
            EventKind::Remove => None,
        }
    }
}
