//! Periodic background reconciliation.
//!
//! A [`ReconciliationLoop`] owns one thread that syncs a
//! [`ReplicaStore`] with its group's shared snapshot every
//! [`ReconcileConfig::period`]. The wait between syncs uses
//! `park_timeout`, so [`shutdown`](ReconciliationLoop::shutdown) wakes the
//! thread immediately instead of waiting out the period, and cancels a
//! sync still waiting for the distributed lock. A sync that already holds
//! the lock runs to completion.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};
use vicinity_core::BlobStore;
use vicinity_lock::{Cancellation, DistributedLock, LockError};
use vicinity_store::{ReplicaStore, StoreError, SyncOutcome};

use crate::config::{ConfigError, ReconcileConfig};

// ── ReconcileReport ───────────────────────────────────────────────

/// Report from [`ReconciliationLoop::shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Syncs attempted, background and [`sync_now`](ReconciliationLoop::sync_now) alike.
    pub syncs: u64,
    /// Syncs that returned an error, not counting syncs cancelled by
    /// shutdown.
    pub failures: u64,
    /// Whether the background thread was joined cleanly.
    pub joined: bool,
}

// ── Shared state ──────────────────────────────────────────────────

struct Shared {
    store: Arc<ReplicaStore>,
    blobs: Arc<dyn BlobStore>,
    lock: Arc<DistributedLock>,
    config: ReconcileConfig,
    shutdown: AtomicBool,
    cancel: Cancellation,
    syncs: AtomicU64,
    failures: AtomicU64,
}

impl Shared {
    /// Background loop. Runs until the shutdown flag is set.
    fn run(&self) {
        let mut deadline = Instant::now() + self.config.period;
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let now = Instant::now();
            if now < deadline {
                // Spurious and shutdown wakeups both land back on the flag check.
                thread::park_timeout(deadline - now);
                continue;
            }
            // Sync failures are logged inside `tick`; the loop keeps going.
            let _ = self.tick();
            deadline = Instant::now() + self.config.period;
        }
        debug!(group = %self.store.config().replica_group, "reconciliation loop stopped");
    }

    fn tick(&self) -> Result<SyncOutcome, StoreError> {
        if self.config.purge_expired {
            self.store.purge_expired();
        }
        self.syncs.fetch_add(1, Ordering::Relaxed);
        let result = self
            .store
            .sync_with_cancel(self.blobs.as_ref(), &self.lock, &self.cancel);
        match &result {
            Ok(_) => {}
            Err(StoreError::Lock(LockError::Cancelled { .. })) => {
                debug!(group = %self.store.config().replica_group, "sync cancelled by shutdown");
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    group = %self.store.config().replica_group,
                    error = %e,
                    "sync failed, retrying next period"
                );
            }
        }
        result
    }
}

// ── ReconciliationLoop ────────────────────────────────────────────

/// Background thread that keeps a replica reconciled with its group.
///
/// Dropping the loop shuts it down.
pub struct ReconciliationLoop {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl ReconciliationLoop {
    /// Validate `config` and start the background thread.
    ///
    /// The first background sync happens one `period` after spawning;
    /// call [`sync_now`](Self::sync_now) to reconcile right away.
    pub fn spawn(
        store: Arc<ReplicaStore>,
        blobs: Arc<dyn BlobStore>,
        lock: Arc<DistributedLock>,
        config: ReconcileConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Arc::new(Shared {
            store,
            blobs,
            lock,
            config,
            shutdown: AtomicBool::new(false),
            cancel: Cancellation::new(),
            syncs: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        });

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("vicinity-reconcile".into())
            .spawn(move || worker.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        info!(
            group = %shared.store.config().replica_group,
            period_ms = shared.config.period.as_millis() as u64,
            "reconciliation loop started"
        );
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Sync on the calling thread, outside the periodic schedule.
    ///
    /// Counts towards [`syncs`](Self::syncs) and, on error,
    /// [`failures`](Self::failures), exactly like a background sync. After
    /// [`shutdown`](Self::shutdown) a contended lock wait is cancelled
    /// immediately.
    pub fn sync_now(&self) -> Result<SyncOutcome, StoreError> {
        self.shared.tick()
    }

    /// Syncs attempted so far.
    pub fn syncs(&self) -> u64 {
        self.shared.syncs.load(Ordering::Relaxed)
    }

    /// Syncs that failed so far.
    pub fn failures(&self) -> u64 {
        self.shared.failures.load(Ordering::Relaxed)
    }

    /// Whether the background thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the background thread and wait for it.
    ///
    /// Sets the shutdown flag, cancels any wait for the distributed lock,
    /// and unparks the thread, which wakes it from its wait immediately.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) -> ReconcileReport {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.cancel.cancel();
        let joined = match self.thread.take() {
            Some(handle) => {
                handle.thread().unpark();
                handle.join().is_ok()
            }
            None => true,
        };
        let report = ReconcileReport {
            syncs: self.syncs(),
            failures: self.failures(),
            joined,
        };
        info!(
            syncs = report.syncs,
            failures = report.failures,
            "reconciliation loop shut down"
        );
        report
    }
}

impl Drop for ReconciliationLoop {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vicinity_core::{Clock, LeaseService, ManualClock};
    use vicinity_lock::{LockConfig, MemoryLeaseService};
    use vicinity_space::{IndexConfig, SpatialIndex};
    use vicinity_store::{MemoryBlobStore, StoreConfig};
    use vicinity_test_utils::fixtures::{manual_clock, CARIBBEAN};
    use vicinity_test_utils::MockBlobStore;

    fn store(clock: &Arc<ManualClock>) -> Arc<ReplicaStore> {
        Arc::new(
            ReplicaStore::new(
                StoreConfig::default(),
                SpatialIndex::new(IndexConfig::default()).unwrap(),
                Arc::clone(clock) as Arc<dyn Clock>,
            )
            .unwrap(),
        )
    }

    fn lock() -> Arc<DistributedLock> {
        Arc::new(
            DistributedLock::new(Arc::new(MemoryLeaseService::new()), LockConfig::default())
                .unwrap(),
        )
    }

    fn every(ms: u64) -> ReconcileConfig {
        ReconcileConfig {
            period: Duration::from_millis(ms),
            ..ReconcileConfig::default()
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached within 5s");
            thread::sleep(Duration::from_millis(5));
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    #[test]
    fn background_sync_publishes_snapshot() {
        let clock = manual_clock();
        let s = store(&clock);
        s.upsert(&"alice".into(), CARIBBEAN.0, CARIBBEAN.1).unwrap();
        let blobs = Arc::new(MemoryBlobStore::new());
        let key = s.state_key();

        let mut rl = ReconciliationLoop::spawn(
            Arc::clone(&s),
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            lock(),
            every(10),
        )
        .unwrap();
        wait_for(|| blobs.get(&key).unwrap().is_some());

        let report = rl.shutdown();
        assert!(report.joined);
        assert!(report.syncs >= 1);
        assert_eq!(report.failures, 0);
        assert!(!rl.is_running());
    }

    #[test]
    fn shutdown_is_prompt_with_long_period() {
        let s = store(&manual_clock());
        let mut rl = ReconciliationLoop::spawn(
            s,
            Arc::new(MemoryBlobStore::new()),
            lock(),
            ReconcileConfig::default(),
        )
        .unwrap();
        assert!(rl.is_running());

        let start = Instant::now();
        let report = rl.shutdown();
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "shutdown took {:?}",
            start.elapsed()
        );
        assert!(report.joined);
        assert_eq!(report.syncs, 0);
    }

    #[test]
    fn shutdown_is_prompt_while_slot_held_elsewhere() {
        let s = store(&manual_clock());
        let leases: Arc<dyn LeaseService> = Arc::new(MemoryLeaseService::new());
        let other = DistributedLock::new(Arc::clone(&leases), LockConfig::default()).unwrap();
        other.lock(&s.state_key()).unwrap();
        let ours = Arc::new(DistributedLock::new(leases, LockConfig::default()).unwrap());

        let mut rl = ReconciliationLoop::spawn(
            Arc::clone(&s),
            Arc::new(MemoryBlobStore::new()),
            ours,
            every(10),
        )
        .unwrap();
        // The first background sync is now blocked on the held slot.
        wait_for(|| rl.syncs() >= 1);
        thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        let report = rl.shutdown();
        assert!(
            start.elapsed() < Duration::from_secs(1),
            "shutdown took {:?}",
            start.elapsed()
        );
        assert!(report.joined);
        assert_eq!(report.failures, 0);
        other.unlock(&s.state_key(), false).unwrap();
    }

    #[test]
    fn shutdown_twice_is_harmless() {
        let s = store(&manual_clock());
        let mut rl = ReconciliationLoop::spawn(
            s,
            Arc::new(MemoryBlobStore::new()),
            lock(),
            ReconcileConfig::default(),
        )
        .unwrap();
        rl.shutdown();
        let again = rl.shutdown();
        assert!(again.joined);
    }

    #[test]
    fn drop_stops_the_thread() {
        let s = store(&manual_clock());
        let blobs = Arc::new(MockBlobStore::new());
        let rl = ReconciliationLoop::spawn(
            s,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            lock(),
            every(5),
        )
        .unwrap();
        wait_for(|| blobs.set_count() >= 1);
        drop(rl);

        let after = blobs.set_count();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(blobs.set_count(), after);
    }

    #[test]
    fn rejects_zero_period() {
        let result = ReconciliationLoop::spawn(
            store(&manual_clock()),
            Arc::new(MemoryBlobStore::new()),
            lock(),
            ReconcileConfig {
                period: Duration::ZERO,
                ..ReconcileConfig::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::ZeroPeriod)));
    }

    // ── Failures ────────────────────────────────────────────────

    #[test]
    fn failures_are_counted_and_retried() {
        let s = store(&manual_clock());
        let blobs = Arc::new(MockBlobStore::new());
        blobs.fail_gets(true);

        let mut rl = ReconciliationLoop::spawn(
            s,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            lock(),
            every(5),
        )
        .unwrap();
        wait_for(|| rl.failures() >= 2);

        blobs.fail_gets(false);
        wait_for(|| blobs.set_count() >= 1);

        let report = rl.shutdown();
        assert!(report.failures >= 2);
        assert!(report.syncs > report.failures);
    }

    // ── sync_now ────────────────────────────────────────────────

    #[test]
    fn sync_now_runs_on_caller_thread() {
        let s = store(&manual_clock());
        s.upsert(&"alice".into(), CARIBBEAN.0, CARIBBEAN.1).unwrap();
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut rl = ReconciliationLoop::spawn(
            Arc::clone(&s),
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            lock(),
            ReconcileConfig::default(),
        )
        .unwrap();

        let outcome = rl.sync_now().unwrap();
        assert!(outcome.merged.is_none());
        assert!(blobs.get(&s.state_key()).unwrap().is_some());
        assert_eq!(rl.shutdown().syncs, 1);
    }

    #[test]
    fn sync_now_surfaces_errors() {
        let s = store(&manual_clock());
        let blobs = Arc::new(MockBlobStore::new());
        blobs.fail_sets(true);
        let rl = ReconciliationLoop::spawn(
            s,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            lock(),
            ReconcileConfig::default(),
        )
        .unwrap();

        assert!(matches!(rl.sync_now(), Err(StoreError::Transport(_))));
        assert_eq!(rl.failures(), 1);
    }

    #[test]
    fn purge_runs_before_sync_when_enabled() {
        let clock = manual_clock();
        let s = store(&clock);
        s.upsert(&"dave".into(), CARIBBEAN.0, CARIBBEAN.1).unwrap();
        clock.advance(Duration::from_secs(600));

        let rl = ReconciliationLoop::spawn(
            Arc::clone(&s),
            Arc::new(MemoryBlobStore::new()),
            lock(),
            ReconcileConfig {
                purge_expired: true,
                ..ReconcileConfig::default()
            },
        )
        .unwrap();
        rl.sync_now().unwrap();
        assert!(s.is_empty());
        assert_eq!(s.event_count(), 0);
    }
}
