//! In-process lease service.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;
use uuid::Uuid;
use vicinity_core::{Lease, LeaseService, TransportError};

struct Held {
    token: String,
    expires: Instant,
}

/// Table size at which writes first sweep out expired entries.
const SWEEP_FLOOR: usize = 256;

struct LeaseTable {
    leases: HashMap<String, Held>,
    markers: HashMap<String, Instant>,
    /// Combined size that triggers the next sweep.
    sweep_at: usize,
}

impl Default for LeaseTable {
    fn default() -> Self {
        Self {
            leases: HashMap::new(),
            markers: HashMap::new(),
            sweep_at: SWEEP_FLOOR,
        }
    }
}

impl LeaseTable {
    /// Drop expired leases and markers once the table has grown past the
    /// sweep threshold. The threshold then tracks twice the live size, so
    /// sweeping stays amortized O(1) per write.
    fn sweep_if_due(&mut self, now: Instant) {
        if self.leases.len() + self.markers.len() < self.sweep_at {
            return;
        }
        let before = self.leases.len() + self.markers.len();
        self.leases.retain(|_, held| held.expires > now);
        self.markers.retain(|_, expires| *expires > now);
        let after = self.leases.len() + self.markers.len();
        self.sweep_at = (after * 2).max(SWEEP_FLOOR);
        debug!(dropped = before - after, live = after, "swept expired leases and markers");
    }

    /// The unexpired lease on `resource`, dropping it if it has expired.
    fn live(&mut self, resource: &str, now: Instant) -> Option<&Held> {
        if self
            .leases
            .get(resource)
            .is_some_and(|held| held.expires <= now)
        {
            self.leases.remove(resource);
            debug!(resource, "expired lease reclaimed");
        }
        self.leases.get(resource)
    }
}

/// A [`LeaseService`] backed by a mutex-protected table.
///
/// Leases and markers expire on the monotonic clock. Releases wake every
/// thread blocked in [`wait_release`](LeaseService::wait_release), so
/// waiters retry as soon as a lease frees up instead of sleeping out their
/// full retry interval.
///
/// Share one instance between every [`DistributedLock`](crate::DistributedLock)
/// that should contend, typically via `Arc<MemoryLeaseService>`.
#[derive(Default)]
pub struct MemoryLeaseService {
    table: Mutex<LeaseTable>,
    released: Condvar,
}

impl MemoryLeaseService {
    /// An empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired leases.
    pub fn active_leases(&self) -> usize {
        let now = Instant::now();
        self.table
            .lock()
            .leases
            .values()
            .filter(|held| held.expires > now)
            .count()
    }
}

impl std::fmt::Debug for MemoryLeaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.lock();
        f.debug_struct("MemoryLeaseService")
            .field("leases", &table.leases.len())
            .field("markers", &table.markers.len())
            .finish()
    }
}

impl LeaseService for MemoryLeaseService {
    fn obtain(&self, resource: &str, ttl: Duration) -> Result<Option<Lease>, TransportError> {
        let now = Instant::now();
        let mut table = self.table.lock();
        if table.live(resource, now).is_some() {
            return Ok(None);
        }
        table.sweep_if_due(now);
        let token = Uuid::new_v4().to_string();
        table.leases.insert(
            resource.to_string(),
            Held {
                token: token.clone(),
                expires: now + ttl,
            },
        );
        Ok(Some(Lease {
            resource: resource.to_string(),
            token,
        }))
    }

    fn release(&self, lease: &Lease) -> Result<(), TransportError> {
        let now = Instant::now();
        let mut table = self.table.lock();
        let owned = table
            .live(&lease.resource, now)
            .is_some_and(|held| held.token == lease.token);
        if !owned {
            return Err(TransportError::LeaseLost {
                resource: lease.resource.clone(),
            });
        }
        table.leases.remove(&lease.resource);
        drop(table);
        self.released.notify_all();
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, TransportError> {
        let now = Instant::now();
        let mut table = self.table.lock();
        match table.markers.get(key) {
            Some(&expires) if expires > now => Ok(true),
            Some(_) => {
                table.markers.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn set_marker(&self, key: &str, ttl: Duration) -> Result<(), TransportError> {
        let now = Instant::now();
        let mut table = self.table.lock();
        table.sweep_if_due(now);
        table.markers.insert(key.to_string(), now + ttl);
        Ok(())
    }

    fn remaining_ttl(&self, resource: &str) -> Result<Option<Duration>, TransportError> {
        let now = Instant::now();
        let mut table = self.table.lock();
        Ok(table
            .live(resource, now)
            .map(|held| held.expires.saturating_duration_since(now)))
    }

    fn wait_release(&self, resource: &str, timeout: Duration) {
        let mut table = self.table.lock();
        if table.live(resource, Instant::now()).is_none() {
            return;
        }
        // Any release wakes every waiter; callers re-check by retrying obtain.
        let _ = self.released.wait_for(&mut table, timeout);
    }
}
