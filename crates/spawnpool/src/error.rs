//! Error types for pool operations
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. Every variant
//! is a local, recoverable condition: the registry reports it and leaves its
//! own state untouched.

use thiserror::Error;

use crate::key::PoolKey;
use crate::lifecycle::InstanceState;

// ============================================================================
// Main Error Type
// ============================================================================

/// Pool operation errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // --- Registry Errors ---
    #[error("No pool registered for key '{key}'")]
    PoolNotRegistered { key: PoolKey },

    #[error("Pool '{key}' has no factory bound")]
    FactoryMissing { key: PoolKey },

    // --- Release Errors ---
    #[error("Instance {slot} of pool '{key}' is already inactive")]
    DoubleRelease { key: PoolKey, slot: u32 },

    #[error("Handle {slot} of pool '{key}' refers to no instance")]
    NullRelease { key: PoolKey, slot: u32 },

    #[error(
        "Handle {slot}@{held_epoch} of pool '{key}' is stale (instance now at epoch {current_epoch})"
    )]
    StaleHandle {
        key: PoolKey,
        slot: u32,
        held_epoch: u64,
        current_epoch: u64,
    },

    // --- Capacity Errors ---
    #[error("Pool '{key}' saturated: {active}/{capacity} instances active")]
    Saturated {
        key: PoolKey,
        active: usize,
        capacity: usize,
    },

    // --- Lifecycle Errors ---
    #[error("Invalid state transition for instance {slot} of pool '{key}': {from} -> {to}")]
    InvalidTransition {
        key: PoolKey,
        slot: u32,
        from: InstanceState,
        to: InstanceState,
    },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to parse configuration: {reason}")]
    ConfigParse { reason: String },
}

impl PoolError {
    /// Create pool-not-registered error
    pub fn pool_not_registered(key: impl Into<PoolKey>) -> Self {
        Self::PoolNotRegistered { key: key.into() }
    }

    /// Create factory-missing error
    pub fn factory_missing(key: impl Into<PoolKey>) -> Self {
        Self::FactoryMissing { key: key.into() }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PoolNotRegistered { .. } => "POOL:REGISTRY:NOT_REGISTERED",
            Self::FactoryMissing { .. } => "POOL:REGISTRY:FACTORY_MISSING",
            Self::DoubleRelease { .. } => "POOL:RELEASE:DOUBLE",
            Self::NullRelease { .. } => "POOL:RELEASE:NULL",
            Self::StaleHandle { .. } => "POOL:RELEASE:STALE",
            Self::Saturated { .. } => "POOL:CAPACITY:SATURATED",
            Self::InvalidTransition { .. } => "POOL:LIFECYCLE:TRANSITION",
            Self::InvalidConfig { .. } => "POOL:CONFIG:INVALID",
            Self::ConfigParse { .. } => "POOL:CONFIG:PARSE",
        }
    }

    /// The pool key this error concerns, if any
    #[must_use]
    pub fn key(&self) -> Option<&PoolKey> {
        match self {
            Self::PoolNotRegistered { key }
            | Self::FactoryMissing { key }
            | Self::DoubleRelease { key, .. }
            | Self::NullRelease { key, .. }
            | Self::StaleHandle { key, .. }
            | Self::Saturated { key, .. }
            | Self::InvalidTransition { key, .. } => Some(key),
            Self::InvalidConfig { .. } | Self::ConfigParse { .. } => None,
        }
    }

    /// Whether a later call could succeed once other callers release
    ///
    /// Only saturation under the reject policy qualifies; every other
    /// condition needs the caller to change what it is doing.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Saturated { .. })
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse {
            reason: err.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
