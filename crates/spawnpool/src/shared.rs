//! Thread-safe registry wrapper.
//!
//! [`Registry`] assumes a single thread. `SharedRegistry` puts one behind a
//! `parking_lot::Mutex` so several threads can acquire and release against
//! the same pools. Every call takes the lock for its whole duration; payload
//! access goes through closures so no reference outlives the lock.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::RegistryConfig;
use crate::error::PoolResult;
use crate::events::PoolEvent;
use crate::key::{InstanceHandle, PoolKey};
use crate::poolable::{Factory, Poolable};
use crate::registry::Registry;
use crate::stats::{PerfSnapshot, PoolStats};

/// Cloneable, lock-protected [`Registry`].
pub struct SharedRegistry<T: Poolable> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: Poolable> Clone for SharedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Poolable> std::fmt::Debug for SharedRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("registry", &*self.inner.lock())
            .finish()
    }
}

impl<T: Poolable> From<Registry<T>> for SharedRegistry<T> {
    fn from(registry: Registry<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }
}

impl<T: Poolable> SharedRegistry<T> {
    /// Create a shared registry from a validated configuration.
    pub fn new(config: RegistryConfig) -> PoolResult<Self> {
        Registry::new(config).map(Self::from)
    }

    /// See [`Registry::initialize`].
    pub fn initialize(&self) -> PoolResult<()> {
        self.inner.lock().initialize()
    }

    /// See [`Registry::shutdown`].
    pub fn shutdown(&self) {
        self.inner.lock().shutdown();
    }

    /// See [`Registry::register_factory`].
    pub fn register_factory<F>(
        &self,
        key: impl Into<PoolKey>,
        factory: F,
        capacity: Option<usize>,
    ) -> PoolResult<()>
    where
        F: Factory<T> + 'static,
    {
        self.inner.lock().register_factory(key, factory, capacity)
    }

    /// See [`Registry::warm`].
    pub fn warm(&self, key: &str, count: usize) -> PoolResult<usize> {
        self.inner.lock().warm(key, count)
    }

    /// See [`Registry::acquire`].
    pub fn acquire(&self, key: &str, placement: &T::Placement) -> PoolResult<InstanceHandle> {
        self.inner.lock().acquire(key, placement)
    }

    /// See [`Registry::release`].
    pub fn release(&self, handle: &InstanceHandle) -> PoolResult<()> {
        self.inner.lock().release(handle)
    }

    /// See [`Registry::clear`].
    pub fn clear(&self, key: &str) -> PoolResult<usize> {
        self.inner.lock().clear(key)
    }

    /// See [`Registry::clear_all`].
    pub fn clear_all(&self) -> usize {
        self.inner.lock().clear_all()
    }

    /// Run `f` on the payload of a live handle.
    ///
    /// `f` runs while the registry lock is held. The lock is not reentrant:
    /// calling back into this `SharedRegistry` (or a clone of it) from
    /// inside `f` deadlocks.
    pub fn with_instance<R>(&self, handle: &InstanceHandle, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.inner.lock().get(handle).map(f)
    }

    /// Run `f` on the mutable payload of a live handle.
    ///
    /// Same locking rule as [`with_instance`](Self::with_instance): `f` must
    /// not touch this registry.
    pub fn with_instance_mut<R>(
        &self,
        handle: &InstanceHandle,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        self.inner.lock().get_mut(handle).map(f)
    }

    /// See [`Registry::is_live`].
    pub fn is_live(&self, handle: &InstanceHandle) -> bool {
        self.inner.lock().is_live(handle)
    }

    /// See [`Registry::stats_for`].
    pub fn stats_for(&self, key: &str) -> Option<PoolStats> {
        self.inner.lock().stats_for(key)
    }

    /// See [`Registry::all_keys`].
    pub fn all_keys(&self) -> Vec<PoolKey> {
        self.inner.lock().all_keys()
    }

    /// See [`Registry::active_instances`].
    pub fn active_instances(&self, key: &str) -> Option<Vec<InstanceHandle>> {
        self.inner.lock().active_instances(key)
    }

    /// See [`Registry::aggregate_perf`].
    pub fn aggregate_perf(&self) -> PerfSnapshot {
        self.inner.lock().aggregate_perf()
    }

    /// See [`Registry::subscribe`].
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.inner.lock().subscribe()
    }
}
