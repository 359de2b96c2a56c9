//! Engine configuration and validation.

use std::time::Duration;

use thiserror::Error;

// ── ReconcileConfig ───────────────────────────────────────────────

/// Configuration for a [`ReconciliationLoop`](crate::ReconciliationLoop).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Time between two background syncs. Default: 5 minutes.
    pub period: Duration,
    /// Drop expired records and events from the store before each sync.
    /// Default: `false`; merging already discards expired upserts.
    pub purge_expired: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(300),
            purge_expired: false,
        }
    }
}

impl ReconcileConfig {
    /// Check that the period is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(())
    }
}

// ── HandlerConfig ─────────────────────────────────────────────────

/// Configuration for a [`MessageHandler`](crate::MessageHandler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Neighbourhood radius, in cells, used to answer nearby requests.
    /// Default: 5.
    pub radius: u32,
    /// Prefix of the per-message idempotency key, which is
    /// `"<key_prefix>:<message id>"`. Default: `"proximity"`.
    pub key_prefix: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            radius: 5,
            key_prefix: "proximity".to_string(),
        }
    }
}

impl HandlerConfig {
    /// Check that the key prefix is non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::EmptyKeyPrefix);
        }
        Ok(())
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected while validating engine configuration or starting a
/// background thread.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// [`ReconcileConfig::period`] is zero.
    #[error("reconcile period must be positive")]
    ZeroPeriod,
    /// [`HandlerConfig::key_prefix`] is the empty string.
    #[error("key_prefix must not be empty")]
    EmptyKeyPrefix,
    /// The OS refused to start a background thread.
    #[error("failed to spawn thread: {reason}")]
    ThreadSpawnFailed {
        /// The underlying I/O error.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let r = ReconcileConfig::default();
        assert!(r.validate().is_ok());
        assert_eq!(r.period, Duration::from_secs(300));
        assert!(!r.purge_expired);

        let h = HandlerConfig::default();
        assert!(h.validate().is_ok());
        assert_eq!(h.radius, 5);
    }

    #[test]
    fn rejects_zero_period() {
        let r = ReconcileConfig {
            period: Duration::ZERO,
            ..ReconcileConfig::default()
        };
        assert_eq!(r.validate(), Err(ConfigError::ZeroPeriod));
    }

    #[test]
    fn rejects_empty_prefix() {
        let h = HandlerConfig {
            key_prefix: String::new(),
            ..HandlerConfig::default()
        };
        assert_eq!(h.validate(), Err(ConfigError::EmptyKeyPrefix));
    }

    #[test]
    fn radius_zero_is_allowed() {
        let h = HandlerConfig {
            radius: 0,
            ..HandlerConfig::default()
        };
        assert!(h.validate().is_ok());
    }
}
