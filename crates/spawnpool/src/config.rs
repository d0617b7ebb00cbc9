//! Registry configuration types

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};
use crate::key::PoolKey;

/// Capacity used when a pool is registered without one.
pub const DEFAULT_CAPACITY: usize = 100;

/// Event bus buffer used when none is configured.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// What `acquire` does when a pool already has `capacity` active instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationPolicy {
    /// Force-release the oldest active instance and hand it to the new
    /// caller. Its previous holder is not notified; their handle goes stale.
    #[default]
    Reclaim,
    /// Fail the acquire with [`PoolError::Saturated`] and take nothing.
    Reject,
}

/// Declaration of one pool in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Key of the pool.
    pub key: PoolKey,
    /// Maximum simultaneous instances; falls back to the registry default.
    #[serde(default)]
    pub capacity: Option<usize>,
    /// Instances to build during `initialize` if a factory is bound.
    #[serde(default)]
    pub prewarm: usize,
}

impl PoolSpec {
    /// Declare a pool with the default capacity and no pre-warming.
    pub fn new(key: impl Into<PoolKey>) -> Self {
        Self {
            key: key.into(),
            capacity: None,
            prewarm: 0,
        }
    }

    /// Set the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set how many instances `initialize` pre-warms.
    pub fn with_prewarm(mut self, prewarm: usize) -> Self {
        self.prewarm = prewarm;
        self
    }
}

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Capacity for pools registered without an explicit one.
    pub default_capacity: usize,
    /// Behaviour of `acquire` on a saturated pool.
    pub saturation: SaturationPolicy,
    /// Buffer size of the lifecycle event bus.
    pub event_buffer: usize,
    /// Pools declared up front and set up by `initialize`.
    pub pools: Vec<PoolSpec>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            saturation: SaturationPolicy::Reclaim,
            event_buffer: DEFAULT_EVENT_BUFFER,
            pools: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> PoolResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning an error if invalid.
    pub fn validate(&self) -> PoolResult<()> {
        if self.default_capacity == 0 {
            return Err(PoolError::invalid_config(
                "default_capacity must be greater than 0",
            ));
        }
        if self.event_buffer == 0 {
            return Err(PoolError::invalid_config(
                "event_buffer must be greater than 0",
            ));
        }
        for (index, spec) in self.pools.iter().enumerate() {
            if spec.capacity == Some(0) {
                return Err(PoolError::invalid_config(format!(
                    "pool '{}' must have capacity greater than 0",
                    spec.key
                )));
            }
            let capacity = spec.capacity.unwrap_or(self.default_capacity);
            if spec.prewarm > capacity {
                return Err(PoolError::invalid_config(format!(
                    "pool '{}' prewarm ({}) must not exceed capacity ({capacity})",
                    spec.key, spec.prewarm
                )));
            }
            if self.pools[..index].iter().any(|other| other.key == spec.key) {
                return Err(PoolError::invalid_config(format!(
                    "pool '{}' is declared more than once",
                    spec.key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_registry_config_default() {
        let config = RegistryConfig::default();
        assert_eq!(config.default_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.saturation, SaturationPolicy::Reclaim);
        assert!(config.pools.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let config = RegistryConfig::from_json_str(
            r#"{
                "default_capacity": 8,
                "saturation": "reject",
                "pools": [
                    { "key": "Zombie", "capacity": 3, "prewarm": 2 },
                    { "key": "Arrow" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.default_capacity, 8);
        assert_eq!(config.saturation, SaturationPolicy::Reject);
        assert_eq!(config.event_buffer, DEFAULT_EVENT_BUFFER);
        assert_eq!(
            config.pools,
            vec![
                PoolSpec::new("Zombie").with_capacity(3).with_prewarm(2),
                PoolSpec::new("Arrow"),
            ]
        );
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = RegistryConfig {
            pools: vec![PoolSpec::new("Zombie").with_capacity(0)],
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().code(), "POOL:CONFIG:INVALID");

        let config = RegistryConfig {
            default_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_prewarm_over_capacity() {
        let config = RegistryConfig {
            pools: vec![PoolSpec::new("Zombie").with_capacity(2).with_prewarm(3)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let config = RegistryConfig {
            pools: vec![PoolSpec::new("Zombie"), PoolSpec::new("Zombie")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = RegistryConfig::from_json_str("{ nope").unwrap_err();
        assert_eq!(err.code(), "POOL:CONFIG:PARSE");
    }
}
