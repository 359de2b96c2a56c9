//! The serialized form of a replica, as published to the shared blob store.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vicinity_core::{Clock, UserId};
use vicinity_space::{Partition, SpatialIndex};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::{Event, UserData};
use crate::replica::Replica;
use crate::store::ReplicaStore;

/// A point-in-time copy of a replica's state.
///
/// Serializes as
/// `{ "location": { region: { user: UserData } }, "user": { user: region }, "eventStack": [Event] }`
/// with the event stack newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Region path to the positions recorded in it.
    pub location: IndexMap<Partition, IndexMap<UserId, UserData>>,
    /// User to the region holding their position.
    pub user: IndexMap<UserId, Partition>,
    /// The event log, newest first.
    #[serde(rename = "eventStack")]
    pub event_stack: Vec<Event>,
}

impl Snapshot {
    /// Check the snapshot against `index` and convert it to live state.
    ///
    /// Rejects region paths of the wrong depth, users whose index entry
    /// and bucket disagree, records filed under the wrong region, and
    /// upsert events whose position cannot be encoded.
    pub(crate) fn into_replica(self, index: &SpatialIndex) -> Result<Replica, StoreError> {
        let Snapshot {
            location,
            user,
            event_stack,
        } = self;

        let mut by_region = IndexMap::with_capacity(location.len());
        for (region, bucket) in location {
            if region.depth() != index.depth() {
                return Err(inconsistent(format!(
                    "region {region} has depth {}, expected {}",
                    region.depth(),
                    index.depth()
                )));
            }
            if bucket.is_empty() {
                continue;
            }
            for (u, data) in &bucket {
                let expected = index.from_coordinates(data.lat, data.long)?;
                if expected != region {
                    return Err(inconsistent(format!(
                        "user {u} at ({}, {}) filed under {region}, belongs in {expected}",
                        data.lat, data.long
                    )));
                }
                if user.get(u) != Some(&region) {
                    return Err(inconsistent(format!(
                        "user {u} in bucket {region} but not indexed there"
                    )));
                }
            }
            by_region.insert(region, bucket);
        }

        for (u, region) in &user {
            let filed = by_region
                .get(region)
                .is_some_and(|bucket| bucket.contains_key(u));
            if !filed {
                return Err(inconsistent(format!(
                    "user {u} indexed in {region} but missing from its bucket"
                )));
            }
        }

        for event in &event_stack {
            if let Some(data) = event.record() {
                index.from_coordinates(data.lat, data.long)?;
            }
        }

        Ok(Replica {
            by_region,
            by_user: user,
            events: event_stack.into(),
        })
    }
}

fn inconsistent(reason: String) -> StoreError {
    StoreError::Snapshot { reason }
}

impl From<&Replica> for Snapshot {
    fn from(r: &Replica) -> Self {
        Snapshot {
            location: r.by_region.clone(),
            user: r.by_user.clone(),
            event_stack: r.events.iter().cloned().collect(),
        }
    }
}

impl ReplicaStore {
    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(&*self.inner.read())
    }

    /// Build a store from a snapshot, validating it against `index`.
    pub fn from_snapshot(
        config: StoreConfig,
        index: SpatialIndex,
        clock: Arc<dyn Clock>,
        snapshot: Snapshot,
    ) -> Result<Self, StoreError> {
        config.validate().map_err(|e| StoreError::Snapshot {
            reason: e.to_string(),
        })?;
        let state = snapshot.into_replica(&index)?;
        Ok(Self::with_state(config, index, clock, state))
    }

    /// The current state as JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(&self.snapshot())?)
    }

    /// Build a store from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(
        config: StoreConfig,
        index: SpatialIndex,
        clock: Arc<dyn Clock>,
        bytes: &[u8],
    ) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        Self::from_snapshot(config, index, clock, snapshot)
    }
}
