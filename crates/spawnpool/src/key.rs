//! Pool keys and instance handles.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier naming a pooled resource type or variant.
///
/// Keys are case-sensitive and flat: `"Zombie"` and `"zombie"` name two
/// unrelated pools. Cloning is a reference-count bump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolKey(Arc<str>);

impl PoolKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PoolKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PoolKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PoolKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for PoolKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl From<&PoolKey> for PoolKey {
    fn from(key: &PoolKey) -> Self {
        key.clone()
    }
}

/// Borrowed reference to one acquired instance.
///
/// A handle combines the pool key, the instance's slot inside that pool and
/// the epoch stamped on the instance when it was acquired. The registry bumps
/// the epoch on every acquire, so a handle kept past its release (or past a
/// forced reclaim) no longer matches and is refused instead of reaching the
/// instance's next holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    key: PoolKey,
    slot: u32,
    epoch: u64,
}

impl InstanceHandle {
    pub(crate) fn new(key: PoolKey, slot: u32, epoch: u64) -> Self {
        Self { key, slot, epoch }
    }

    /// Key of the pool that owns the instance.
    #[must_use]
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Slot of the instance inside its pool.
    #[must_use]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Epoch the instance carried when this handle was issued.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether both handles point at the same underlying instance,
    /// regardless of which acquisition issued them.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.slot == other.slot && self.key == other.key
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.key, self.slot, self.epoch)
    }
}
