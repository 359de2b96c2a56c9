//! Event-log reconciliation between two replicas.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, warn};
use vicinity_core::Timestamp;
use vicinity_space::SpatialIndex;

use crate::record::{Event, EventKind};
use crate::replica::Replica;
use crate::store::ReplicaStore;

/// Counters from one merge pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Events applied to both sides and kept in both logs.
    pub applied: usize,
    /// Older events for a user already decided this pass.
    pub superseded: usize,
    /// Upserts older than the TTL, dropped without applying.
    pub expired: usize,
}

impl ReplicaStore {
    /// Reconcile this store and `other` so both hold the same state.
    ///
    /// Both event logs are drained together, newest event first. The first
    /// event seen for a user decides that user for the whole pass; older
    /// events for them are dropped. A remove is applied to both stores; an
    /// upsert is applied to both (with its own position and timestamp) only
    /// while it is younger than the TTL. Applied events are then written
    /// back to both logs, so each log ends up with at most one event per
    /// user and either side can pass the history on to a third replica.
    ///
    /// Both stores are write-locked for the duration, lower instance id
    /// first, so concurrent `a.merge(&b)` and `b.merge(&a)` cannot
    /// deadlock. Merging a store with itself does nothing.
    pub fn merge(&self, other: &ReplicaStore) -> MergeStats {
        if self.id == other.id {
            return MergeStats::default();
        }
        let now = self.clock.now();
        let (mut mine, mut theirs) = if self.id < other.id {
            let mine = self.inner.write();
            let theirs = other.inner.write();
            (mine, theirs)
        } else {
            let theirs = other.inner.write();
            let mine = self.inner.write();
            (mine, theirs)
        };
        let stats = merge_replicas(&mut mine, &mut theirs, &self.index, self.config.ttl, now);
        debug!(
            local = self.id,
            remote = other.id,
            applied = stats.applied,
            superseded = stats.superseded,
            expired = stats.expired,
            "merged"
        );
        stats
    }
}

/// Pop the newer of the two log fronts. Ties go to `b`.
fn pop_newest(a: &mut VecDeque<Event>, b: &mut VecDeque<Event>) -> Option<Event> {
    let take_a = match (a.front(), b.front()) {
        (None, None) => return None,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (Some(x), Some(y)) => x.timestamp > y.timestamp,
    };
    if take_a {
        a.pop_front()
    } else {
        b.pop_front()
    }
}

pub(crate) fn merge_replicas(
    a: &mut Replica,
    b: &mut Replica,
    index: &SpatialIndex,
    ttl: Duration,
    now: Timestamp,
) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut seen = HashSet::new();
    let mut applied = Vec::new();

    while let Some(event) = pop_newest(&mut a.events, &mut b.events) {
        if !seen.insert(event.user.clone()) {
            stats.superseded += 1;
            continue;
        }
        match event.kind {
            EventKind::Remove => {
                a.apply_remove(&event.user, Some(event.timestamp));
                b.apply_remove(&event.user, Some(event.timestamp));
            }
            EventKind::Upsert { lat, long } => {
                if !event.timestamp.is_live(ttl, now) {
                    stats.expired += 1;
                    continue;
                }
                let Some(data) = event.record() else {
                    continue;
                };
                let written = a
                    .apply_upsert(index, &event.user, data)
                    .and_then(|_| b.apply_upsert(index, &event.user, data));
                if let Err(e) = written {
                    warn!(user = %event.user, lat, long, error = %e, "dropping unencodable upsert");
                    continue;
                }
            }
        }
        applied.push(event);
    }

    stats.applied = applied.len();
    b.events = applied.iter().cloned().collect();
    a.events = applied.into();
    stats
}
