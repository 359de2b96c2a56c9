//! The replicated position store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use vicinity_core::{Clock, UserId};
use vicinity_space::SpatialIndex;

use crate::config::{ConfigError, StoreConfig};
use crate::error::StoreError;
use crate::record::{Event, UserData};
use crate::replica::Replica;

/// Source of per-instance ids; merges lock the lower id first.
static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// One process's view of who is where.
///
/// Positions are last-write-wins by the writer's wall-clock timestamp.
/// Every accepted mutation is also recorded in an event log (newest
/// first), which [`merge`](Self::merge) replays to reconcile replicas.
///
/// All operations take `&self`: reads share a read lock, mutations take
/// the write lock, so a store can be wrapped in an `Arc` and used from
/// many threads.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vicinity_core::{SystemClock, UserId};
/// use vicinity_space::{IndexConfig, SpatialIndex};
/// use vicinity_store::{ReplicaStore, StoreConfig};
///
/// let index = SpatialIndex::new(IndexConfig::default()).unwrap();
/// let store = ReplicaStore::new(StoreConfig::default(), index, Arc::new(SystemClock)).unwrap();
///
/// store.upsert(&"alice".into(), 20.0, -60.0).unwrap();
/// store.upsert(&"bob".into(), 20.0, -60.0).unwrap();
/// assert_eq!(store.nearby(&"alice".into(), 0).unwrap(), vec![UserId::from("bob")]);
/// ```
pub struct ReplicaStore {
    pub(crate) id: u64,
    pub(crate) config: StoreConfig,
    pub(crate) index: SpatialIndex,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) inner: RwLock<Replica>,
}

impl ReplicaStore {
    /// An empty store.
    pub fn new(
        config: StoreConfig,
        index: SpatialIndex,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_state(config, index, clock, Replica::default()))
    }

    pub(crate) fn with_state(
        config: StoreConfig,
        index: SpatialIndex,
        clock: Arc<dyn Clock>,
        state: Replica,
    ) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            index,
            clock,
            inner: RwLock::new(state),
        }
    }

    /// The store's configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The spatial index used to bucket positions.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Record `user` at `(lat, long)` as of now.
    ///
    /// A no-op if the user's current record is strictly newer than now
    /// (a clock that stepped backwards must not roll a position back).
    /// Fails only if the coordinate cannot be encoded.
    pub fn upsert(&self, user: &UserId, lat: f64, long: f64) -> Result<(), StoreError> {
        let now = self.clock.now();
        let data = UserData {
            lat,
            long,
            timestamp: now,
        };
        let mut inner = self.inner.write();
        if inner.apply_upsert(&self.index, user, data)? {
            inner
                .events
                .push_front(Event::upsert(user.clone(), lat, long, now));
            debug!(%user, lat, long, %now, "upsert");
        } else {
            debug!(%user, %now, "upsert skipped, newer record present");
        }
        Ok(())
    }

    /// Forget `user`. Returns whether they were present.
    ///
    /// Removing an unknown user records nothing.
    pub fn remove(&self, user: &UserId) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.write();
        if inner.apply_remove(user, None).is_none() {
            return false;
        }
        inner.events.push_front(Event::remove(user.clone(), now));
        debug!(%user, %now, "remove");
        true
    }

    /// The recorded position of `user`.
    pub fn get(&self, user: &UserId) -> Result<UserData, StoreError> {
        self.inner
            .read()
            .record(user)
            .copied()
            .ok_or_else(|| StoreError::UnknownUser { user: user.clone() })
    }

    /// Every other user whose live record lies within `radius` region hops
    /// of `user`'s region.
    ///
    /// The result has no meaningful order. Fails with
    /// [`StoreError::UnknownUser`] if `user` has no record.
    pub fn nearby(&self, user: &UserId, radius: u32) -> Result<Vec<UserId>, StoreError> {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let inner = self.inner.read();
        let region = inner
            .by_user
            .get(user)
            .ok_or_else(|| StoreError::UnknownUser { user: user.clone() })?;

        let mut found = Vec::new();
        for p in self.index.nearby(region, radius) {
            let Some(bucket) = inner.by_region.get(&p) else {
                continue;
            };
            found.extend(
                bucket
                    .iter()
                    .filter(|(other, data)| *other != user && data.timestamp.is_live(ttl, now))
                    .map(|(other, _)| other.clone()),
            );
        }
        Ok(found)
    }

    /// Drop every record and event that has outlived the TTL.
    ///
    /// Returns the number of records removed. Expired records are already
    /// invisible to [`nearby`](Self::nearby); this reclaims their memory.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut inner = self.inner.write();

        let expired: Vec<UserId> = inner
            .by_region
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|(_, data)| !data.timestamp.is_live(ttl, now))
            .map(|(user, _)| user.clone())
            .collect();
        for user in &expired {
            inner.apply_remove(user, None);
        }
        let before = inner.events.len();
        inner.events.retain(|e| e.timestamp.is_live(ttl, now));
        let dropped_events = before - inner.events.len();

        if !expired.is_empty() || dropped_events > 0 {
            debug!(records = expired.len(), events = dropped_events, "purged expired");
        }
        expired.len()
    }

    /// Number of users with a record.
    pub fn len(&self) -> usize {
        self.inner.read().by_user.len()
    }

    /// Whether no user has a record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events in the log.
    pub fn event_count(&self) -> usize {
        self.inner.read().events.len()
    }

    /// A copy of the event log, newest first.
    pub fn events(&self) -> Vec<Event> {
        self.inner.read().events.iter().cloned().collect()
    }

    /// Every user with a record, in no particular order.
    pub fn users(&self) -> Vec<UserId> {
        self.inner.read().by_user.keys().cloned().collect()
    }
}

impl fmt::Debug for ReplicaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ReplicaStore")
            .field("id", &self.id)
            .field("replica_group", &self.config.replica_group)
            .field("users", &inner.by_user.len())
            .field("regions", &inner.by_region.len())
            .field("events", &inner.events.len())
            .finish()
    }
}
