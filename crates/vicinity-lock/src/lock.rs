//! The lease-based distributed lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};
use vicinity_core::{format_key, Lease, LeaseService};

use crate::cancel::Cancellation;
use crate::config::{ConfigError, LockConfig};
use crate::error::LockError;

/// Shortest wait between obtain attempts, so a lease that is about to
/// expire does not turn the retry loop into a spin.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Longest single wait while a cancellable caller is blocked.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Poll interval while another thread of the same instance holds the
/// resource.
const LOCAL_POLL: Duration = Duration::from_millis(10);

/// The marker key recording that `resource` has been processed.
///
/// ```
/// assert_eq!(vicinity_lock::marker_key("msg-7"), "resource-lock:resource:msg-7");
/// ```
pub fn marker_key(resource: &str) -> String {
    format_key(&["resource-lock", "resource", resource])
}

/// Mutual exclusion on named resources across processes.
///
/// Each successful [`lock`](Self::lock) holds a lease that the service
/// reclaims after `lease_ttl`, so a holder that dies without unlocking
/// blocks others for at most one TTL. The leases this instance holds are
/// tracked locally; [`unlock`](Self::unlock) of a resource it does not hold
/// fails with [`LockError::NotHeld`]. Threads sharing one instance also
/// exclude each other on a resource until the holder unlocks, even after
/// the holder's lease has expired.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vicinity_lock::{DistributedLock, LockConfig, MemoryLeaseService};
///
/// let lock = DistributedLock::new(Arc::new(MemoryLeaseService::new()), LockConfig::default())
///     .unwrap();
///
/// lock.lock("job-1").unwrap();
/// assert!(!lock.is_processed("job-1").unwrap());
/// lock.unlock("job-1", true).unwrap();
/// assert!(lock.is_processed("job-1").unwrap());
/// ```
pub struct DistributedLock {
    service: Arc<dyn LeaseService>,
    config: LockConfig,
    held: Mutex<HashMap<String, Lease>>,
}

impl DistributedLock {
    /// Create a lock over `service`, validating the timing configuration.
    pub fn new(service: Arc<dyn LeaseService>, config: LockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            service,
            config,
            held: Mutex::new(HashMap::new()),
        })
    }

    /// The timing configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Block until the lease on `resource` is obtained.
    ///
    /// Retries until it wins or `max_wait` elapses. Between attempts it
    /// waits on the service's release notification, armed with the
    /// shorter of `retry_interval` and the holder's remaining lease time.
    pub fn lock(&self, resource: &str) -> Result<(), LockError> {
        self.acquire(resource, None)
    }

    /// Like [`lock`](Self::lock), but gives up with
    /// [`LockError::Cancelled`] once `cancel` fires. Waits are capped so the
    /// flag is noticed within tens of milliseconds.
    pub fn lock_with_cancel(&self, resource: &str, cancel: &Cancellation) -> Result<(), LockError> {
        self.acquire(resource, Some(cancel))
    }

    fn acquire(&self, resource: &str, cancel: Option<&Cancellation>) -> Result<(), LockError> {
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            if cancel.is_some_and(Cancellation::is_cancelled) {
                debug!(resource, attempts, "lock wait cancelled");
                return Err(LockError::Cancelled {
                    resource: resource.to_string(),
                });
            }

            attempts += 1;
            // The held map stays locked across obtain so two threads sharing
            // this instance never both record a lease on one resource.
            let held_here = {
                let mut held = self.held.lock();
                if held.contains_key(resource) {
                    true
                } else {
                    if let Some(lease) = self.service.obtain(resource, self.config.lease_ttl)? {
                        debug!(resource, attempts, "lock obtained");
                        held.insert(resource.to_string(), lease);
                        return Ok(());
                    }
                    false
                }
            };

            let mut wait = self.config.retry_interval;
            if held_here {
                // Another thread of this instance holds it, possibly past its
                // lease TTL; only its unlock frees the resource.
                wait = wait.min(LOCAL_POLL);
            } else if let Some(remaining) = self.service.remaining_ttl(resource)? {
                wait = wait.min(remaining);
            }
            if cancel.is_some() {
                wait = wait.min(CANCEL_POLL);
            }
            if let Some(max_wait) = self.config.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    debug!(resource, attempts, ?waited, "lock wait timed out");
                    return Err(LockError::Timeout {
                        resource: resource.to_string(),
                        waited,
                    });
                }
                wait = wait.min(max_wait - waited);
            }
            if held_here {
                thread::sleep(wait.max(MIN_WAIT));
            } else {
                self.service.wait_release(resource, wait.max(MIN_WAIT));
            }
        }
    }

    /// Release the lease on `resource`.
    ///
    /// With `processed = true` the processed marker is set (for
    /// `marker_ttl`) before the lease is released. The lease is released
    /// even if setting the marker fails; the first error is returned.
    pub fn unlock(&self, resource: &str, processed: bool) -> Result<(), LockError> {
        let lease = self
            .held
            .lock()
            .remove(resource)
            .ok_or_else(|| LockError::NotHeld {
                resource: resource.to_string(),
            })?;

        let marked = if processed {
            self.service
                .set_marker(&marker_key(resource), self.config.marker_ttl)
        } else {
            Ok(())
        };
        let released = self.service.release(&lease);
        debug!(resource, processed, "lock released");
        marked?;
        released?;
        Ok(())
    }

    /// Whether a previous holder unlocked `resource` with `processed = true`
    /// within the last `marker_ttl`.
    pub fn is_processed(&self, resource: &str) -> Result<bool, LockError> {
        Ok(self.service.exists(&marker_key(resource))?)
    }

    /// Whether this instance currently holds `resource`.
    pub fn holds(&self, resource: &str) -> bool {
        self.held.lock().contains_key(resource)
    }

    /// Lock `resource` and return a guard that unlocks it on drop.
    ///
    /// Dropping the guard unlocks with `processed = false`; use
    /// [`LockGuard::commit`] to choose.
    pub fn guard(&self, resource: &str) -> Result<LockGuard<'_>, LockError> {
        self.lock(resource)?;
        Ok(LockGuard {
            lock: self,
            resource: resource.to_string(),
            armed: true,
        })
    }
}

impl fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedLock")
            .field("config", &self.config)
            .field("held", &self.held.lock().len())
            .finish()
    }
}

/// Scoped ownership of a resource locked through [`DistributedLock::guard`].
#[must_use = "dropping the guard immediately releases the lock"]
pub struct LockGuard<'a> {
    lock: &'a DistributedLock,
    resource: String,
    armed: bool,
}

impl LockGuard<'_> {
    /// The locked resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Unlock now, recording whether the resource was processed.
    pub fn commit(mut self, processed: bool) -> Result<(), LockError> {
        self.armed = false;
        self.lock.unlock(&self.resource, processed)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.lock.unlock(&self.resource, false) {
                warn!(resource = %self.resource, error = %e, "unlock on guard drop failed");
            }
        }
    }
}
