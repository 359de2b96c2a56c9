//! The lock-protected state of one replica.

use std::collections::VecDeque;

use indexmap::IndexMap;
use vicinity_core::{Timestamp, UserId};
use vicinity_space::{Partition, SpaceError, SpatialIndex};

use crate::record::{Event, UserData};

/// Both position indexes and the event log.
///
/// Invariant: `by_user[u] == r` if and only if `by_region[r]` has an entry
/// for `u`, and no bucket in `by_region` is empty.
#[derive(Clone, Debug, Default)]
pub(crate) struct Replica {
    pub(crate) by_region: IndexMap<Partition, IndexMap<UserId, UserData>>,
    pub(crate) by_user: IndexMap<UserId, Partition>,
    /// Front is newest.
    pub(crate) events: VecDeque<Event>,
}

impl Replica {
    /// The record for `user`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `user` is indexed in a region whose bucket does not list
    /// them; that is an invariant violation.
    pub(crate) fn record(&self, user: &UserId) -> Option<&UserData> {
        let region = self.by_user.get(user)?;
        let data = self
            .by_region
            .get(region)
            .and_then(|bucket| bucket.get(user));
        match data {
            Some(data) => Some(data),
            None => panic!("user {user} indexed in region {region} but missing from its bucket"),
        }
    }

    /// Write `data` for `user` unless their current record is strictly newer.
    ///
    /// Returns whether the write happened.
    pub(crate) fn apply_upsert(
        &mut self,
        index: &SpatialIndex,
        user: &UserId,
        data: UserData,
    ) -> Result<bool, SpaceError> {
        let region = index.from_coordinates(data.lat, data.long)?;
        if self
            .record(user)
            .is_some_and(|prev| prev.timestamp > data.timestamp)
        {
            return Ok(false);
        }
        self.detach(user);
        self.by_region
            .entry(region.clone())
            .or_default()
            .insert(user.clone(), data);
        self.by_user.insert(user.clone(), region);
        Ok(true)
    }

    /// Delete `user`'s record.
    ///
    /// With `at = Some(t)`, a record strictly newer than `t` survives.
    /// Returns the removed record.
    pub(crate) fn apply_remove(&mut self, user: &UserId, at: Option<Timestamp>) -> Option<UserData> {
        let prev = *self.record(user)?;
        if at.is_some_and(|t| prev.timestamp > t) {
            return None;
        }
        self.detach(user)
    }

    /// Unlink `user` from both indexes, pruning an emptied bucket.
    fn detach(&mut self, user: &UserId) -> Option<UserData> {
        let region = self.by_user.swap_remove(user)?;
        let bucket = self.by_region.get_mut(&region)?;
        let data = bucket.swap_remove(user);
        if bucket.is_empty() {
            self.by_region.swap_remove(&region);
        }
        data
    }
}
