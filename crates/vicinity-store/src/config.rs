//! Store configuration and validation.

use std::time::Duration;

use thiserror::Error;

/// Configuration for a [`ReplicaStore`](crate::ReplicaStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Replicas with the same group reconcile through the same shared
    /// snapshot slot. Default: `"default"`.
    pub replica_group: String,
    /// How long a position stays visible after it was written, and how
    /// long an upsert event stays eligible for merging. Default: 5 minutes.
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            replica_group: "default".to_string(),
            ttl: Duration::from_secs(300),
        }
    }
}

impl StoreConfig {
    /// Check that the group is named and the TTL is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replica_group.is_empty() {
            return Err(ConfigError::EmptyReplicaGroup);
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(())
    }
}

/// Errors detected by [`StoreConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `replica_group` is the empty string.
    #[error("replica_group must not be empty")]
    EmptyReplicaGroup,
    /// `ttl` is zero, which would make every record expire on write.
    #[error("ttl must be positive")]
    ZeroTtl,
}
