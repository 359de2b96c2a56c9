//! Lock timing configuration and validation.

use std::time::Duration;

use thiserror::Error;

/// Timing parameters for a [`DistributedLock`](crate::DistributedLock).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockConfig {
    /// How long an obtained lease lives before the service reclaims it.
    /// Default: 5 minutes.
    pub lease_ttl: Duration,
    /// How long a "processed" marker lives after `unlock(_, true)`.
    /// Independent of the lease TTL. Default: 5 minutes.
    pub marker_ttl: Duration,
    /// Upper bound on each wait between obtain attempts. Default: 1 second.
    pub retry_interval: Duration,
    /// Give up with [`LockError::Timeout`](crate::LockError::Timeout) after
    /// this long. `None` waits indefinitely. Default: `None`.
    pub max_wait: Option<Duration>,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(300),
            marker_ttl: Duration::from_secs(300),
            retry_interval: Duration::from_secs(1),
            max_wait: None,
        }
    }
}

impl LockConfig {
    /// Check that every duration is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("lease_ttl", self.lease_ttl),
            ("marker_ttl", self.marker_ttl),
            ("retry_interval", self.retry_interval),
        ];
        for (field, value) in fields {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        Ok(())
    }
}

/// Errors detected by [`LockConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A duration that must be positive was zero.
    #[error("{field} must be positive")]
    ZeroDuration {
        /// Name of the offending field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = LockConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.lease_ttl, Duration::from_secs(300));
        assert_eq!(c.retry_interval, Duration::from_secs(1));
        assert!(c.max_wait.is_none());
    }

    #[test]
    fn zero_durations_rejected() {
        let c = LockConfig {
            retry_interval: Duration::ZERO,
            ..LockConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::ZeroDuration {
                field: "retry_interval"
            })
        );
        let c = LockConfig {
            lease_ttl: Duration::ZERO,
            ..LockConfig::default()
        };
        assert!(c.validate().is_err());
    }
}
