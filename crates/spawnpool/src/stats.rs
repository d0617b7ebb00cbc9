//! Pool statistics snapshots.

use serde::Serialize;

use crate::key::PoolKey;

/// Point-in-time statistics for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// The pool key.
    pub key: PoolKey,
    /// Instances parked in the inactive store.
    pub inactive: usize,
    /// Instances currently held by callers.
    pub active: usize,
    /// `inactive + active`.
    pub total: usize,
    /// Maximum simultaneous active instances.
    pub capacity: usize,
    /// Acquires served from the inactive store since the last clear.
    pub hits: u64,
    /// Acquires that had to construct or reclaim since the last clear.
    pub misses: u64,
    /// Forced reclaims on a saturated pool since the last clear.
    pub reclaims: u64,
    /// Instances ever constructed.
    pub created: u64,
    /// Instances ever destroyed.
    pub destroyed: u64,
}

impl PoolStats {
    /// Fraction of acquires served from the inactive store.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }
}

/// Aggregate figures across every registered pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerfSnapshot {
    /// Number of registered pools.
    pub pools: usize,
    /// Instances owned by the registry (inactive and active).
    pub total_pooled: usize,
    /// Instances currently held by callers.
    pub total_active: usize,
    /// Cumulative hits.
    pub hits: u64,
    /// Cumulative misses.
    pub misses: u64,
    /// Cumulative forced reclaims.
    pub reclaims: u64,
}

impl PerfSnapshot {
    /// Fraction of acquires served from inactive stores.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    pub(crate) fn add(&mut self, stats: &PoolStats) {
        self.pools += 1;
        self.total_pooled += stats.total;
        self.total_active += stats.active;
        self.hits += stats.hits;
        self.misses += stats.misses;
        self.reclaims += stats.reclaims;
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
