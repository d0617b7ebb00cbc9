//! Pool registry: factory bindings, acquire/release engine and introspection.
//!
//! The registry is the sole owner of every pooled instance. Callers receive
//! [`InstanceHandle`]s and reach the payload through [`Registry::get`] /
//! [`Registry::get_mut`] while their handle is live.
//!
//! A `Registry` is single-threaded: every operation runs to completion on
//! the calling thread and there is no internal locking. Hosts that need to
//! share one across threads wrap it in a [`SharedRegistry`](crate::SharedRegistry).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{RegistryConfig, SaturationPolicy};
use crate::error::{PoolError, PoolResult};
use crate::events::{EventBus, PoolEvent};
use crate::key::{InstanceHandle, PoolKey};
use crate::pool::{Pool, PooledInstance};
use crate::poolable::{Factory, Poolable};
use crate::stats::{PerfSnapshot, PoolStats};

/// Keyed object pools of one resource type.
///
/// # Example
/// ```
/// use spawnpool::{Poolable, Registry};
///
/// #[derive(Default)]
/// struct Arrow {
///     x: f32,
///     flying: bool,
/// }
///
/// impl Poolable for Arrow {
///     type Placement = f32;
///
///     fn apply_placement(&mut self, x: &f32) {
///         self.x = *x;
///     }
///
///     fn on_acquire(&mut self) {
///         self.flying = true;
///     }
///
///     fn on_release(&mut self) {
///         self.flying = false;
///     }
/// }
///
/// let mut registry = Registry::<Arrow>::default();
/// registry.register_factory("Arrow", Arrow::default, Some(16))?;
/// registry.warm("Arrow", 4)?;
///
/// let arrow = registry.acquire("Arrow", &2.5)?;
/// assert!(registry.get(&arrow).is_some_and(|a| a.flying));
/// registry.release(&arrow)?;
/// # Ok::<(), spawnpool::PoolError>(())
/// ```
pub struct Registry<T: Poolable> {
    config: RegistryConfig,
    pools: HashMap<PoolKey, Pool<T>>,
    factories: HashMap<PoolKey, Box<dyn Factory<T>>>,
    events: Arc<EventBus>,
    next_epoch: u64,
    initialized: bool,
}

impl<T: Poolable> Registry<T> {
    /// Create a registry from a validated configuration.
    ///
    /// Pools listed in `config.pools` are set up by [`initialize`](Self::initialize).
    pub fn new(config: RegistryConfig) -> PoolResult<Self> {
        config.validate()?;
        let events = Arc::new(EventBus::new(config.event_buffer));
        Ok(Self::with_parts(config, events))
    }

    /// Create a registry that reports to an existing event bus.
    pub fn with_event_bus(config: RegistryConfig, events: Arc<EventBus>) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self::with_parts(config, events))
    }

    fn with_parts(config: RegistryConfig, events: Arc<EventBus>) -> Self {
        Self {
            config,
            pools: HashMap::new(),
            factories: HashMap::new(),
            events,
            next_epoch: 0,
            initialized: false,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Declare every configured pool and pre-warm those with a factory.
    ///
    /// Pools whose factory is not bound yet are declared anyway; their
    /// pre-warm is reported as [`PoolError::FactoryMissing`] and skipped.
    /// Calling this twice is a no-op.
    pub fn initialize(&mut self) -> PoolResult<()> {
        if self.initialized {
            debug!("pool registry already initialized");
            return Ok(());
        }

        let specs = self.config.pools.clone();
        for spec in &specs {
            self.declare_pool(spec.key.clone(), spec.capacity)?;
            if spec.prewarm > 0 {
                // Failures are reported by warm; the pool stays usable.
                let _ = self.warm(spec.key.as_str(), spec.prewarm);
            }
        }

        self.initialized = true;
        info!(pools = self.pools.len(), "pool registry initialized");
        Ok(())
    }

    /// Destroy every instance and forget every pool and factory.
    pub fn shutdown(&mut self) {
        let destroyed = self.clear_all();
        let pools = self.pools.len();
        self.pools.clear();
        self.factories.clear();
        self.initialized = false;
        info!(pools, destroyed, "pool registry shut down");
    }

    /// Whether [`initialize`](Self::initialize) has run since the last shutdown.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Bind `key` to `factory` with a maximum capacity.
    ///
    /// `None` keeps the capacity of an already declared pool, or uses the
    /// configured default for a new one. Re-registering overwrites the
    /// binding and logs a warning; instances built by the old factory stay
    /// in the pool.
    pub fn register_factory<F>(
        &mut self,
        key: impl Into<PoolKey>,
        factory: F,
        capacity: Option<usize>,
    ) -> PoolResult<()>
    where
        F: Factory<T> + 'static,
    {
        let key = key.into();
        if capacity == Some(0) {
            return Err(self.report(PoolError::invalid_config(format!(
                "pool '{key}' must have capacity greater than 0"
            ))));
        }

        let replaced = self.factories.insert(key.clone(), Box::new(factory)).is_some();
        let capacity = self.ensure_pool(&key, capacity);

        if replaced {
            warn!(key = %key, capacity, "pool factory re-registered; existing instances kept");
        } else {
            debug!(key = %key, capacity, "pool factory registered");
        }
        self.events.emit(PoolEvent::Registered {
            key,
            capacity,
            replaced,
        });
        Ok(())
    }

    /// Declare a pool without binding a factory.
    ///
    /// The pool accepts `warm`/`acquire` calls once a factory is registered
    /// for the key; until then they fail with [`PoolError::FactoryMissing`].
    pub fn declare_pool(&mut self, key: impl Into<PoolKey>, capacity: Option<usize>) -> PoolResult<()> {
        let key = key.into();
        if capacity == Some(0) {
            return Err(self.report(PoolError::invalid_config(format!(
                "pool '{key}' must have capacity greater than 0"
            ))));
        }
        let capacity = self.ensure_pool(&key, capacity);
        debug!(key = %key, capacity, "pool declared");
        Ok(())
    }

    fn ensure_pool(&mut self, key: &PoolKey, capacity: Option<usize>) -> usize {
        let default_capacity = self.config.default_capacity;
        let pool = self
            .pools
            .entry(key.clone())
            .or_insert_with(|| Pool::new(key.clone(), capacity.unwrap_or(default_capacity)));
        if let Some(capacity) = capacity {
            pool.set_capacity(capacity);
        }
        pool.capacity()
    }

    /// Build up to `count` instances ahead of use and park them.
    ///
    /// Never builds past the pool's capacity; the excess is skipped with a
    /// warning. Returns how many instances were built.
    pub fn warm(&mut self, key: &str, count: usize) -> PoolResult<usize> {
        let result = self.try_warm(key, count);
        result.map_err(|err| self.report(err))
    }

    fn try_warm(&mut self, key: &str, count: usize) -> PoolResult<usize> {
        let pool = self
            .pools
            .get_mut(key)
            .ok_or_else(|| PoolError::pool_not_registered(key))?;
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| PoolError::factory_missing(key))?;

        let headroom = pool.capacity().saturating_sub(pool.total());
        let build = count.min(headroom);
        if build < count {
            warn!(
                key,
                requested = count,
                built = build,
                capacity = pool.capacity(),
                "warm clamped to pool capacity"
            );
        }

        for _ in 0..build {
            let slot = pool.adopt(factory.create())?;
            pool.park(slot);
        }

        debug!(key, built = build, "pool warmed");
        self.events.emit(PoolEvent::Warmed {
            key: pool.key().clone(),
            created: build,
        });
        Ok(build)
    }

    // -----------------------------------------------------------------------
    // Acquire / release
    // -----------------------------------------------------------------------

    /// Hand out an instance of `key`, placed at `placement`.
    ///
    /// Reuses the most recently released instance when one is parked.
    /// Otherwise builds a new one while fewer than `capacity` are active.
    /// On a saturated pool the configured [`SaturationPolicy`] applies:
    /// `Reclaim` force-releases the longest-held instance and hands it over
    /// (its previous holder's handle goes stale), `Reject` fails with
    /// [`PoolError::Saturated`].
    pub fn acquire(&mut self, key: &str, placement: &T::Placement) -> PoolResult<InstanceHandle> {
        let result = self.try_acquire(key, placement);
        result.map_err(|err| self.report(err))
    }

    fn try_acquire(&mut self, key: &str, placement: &T::Placement) -> PoolResult<InstanceHandle> {
        let pool = self
            .pools
            .get_mut(key)
            .ok_or_else(|| PoolError::pool_not_registered(key))?;

        let (slot, hit) = if pool.active_len() >= pool.capacity() {
            if self.config.saturation == SaturationPolicy::Reject {
                return Err(PoolError::Saturated {
                    key: pool.key().clone(),
                    active: pool.active_len(),
                    capacity: pool.capacity(),
                });
            }
            let capacity = pool.capacity();
            let saturated = || PoolError::Saturated {
                key: PoolKey::from(key),
                active: capacity,
                capacity,
            };
            let victim = pool.oldest_active().ok_or_else(saturated)?;
            let stale = pool.current_handle(victim).ok_or_else(saturated)?;
            pool.deactivate(victim)?;
            pool.record_miss();
            pool.record_reclaim();

            warn!(
                key,
                handle = %stale,
                capacity,
                "pool capacity exceeded; reclaimed active instance"
            );
            self.events.emit(PoolEvent::Reclaimed {
                handle: stale,
                capacity,
            });
            (pool.pop_inactive().ok_or_else(saturated)?, false)
        } else if let Some(slot) = pool.pop_inactive() {
            pool.record_hit();
            (slot, true)
        } else {
            let factory = self
                .factories
                .get(key)
                .ok_or_else(|| PoolError::factory_missing(key))?;
            pool.record_miss();
            (pool.adopt(factory.create())?, false)
        };

        self.next_epoch += 1;
        let handle = pool.activate(slot, self.next_epoch, placement)?;

        debug!(handle = %handle, hit, "instance acquired");
        self.events.emit(PoolEvent::Acquired {
            handle: handle.clone(),
            hit,
        });
        Ok(handle)
    }

    /// Give an instance back to its pool.
    ///
    /// Fails without touching any state when the handle refers to no
    /// instance ([`PoolError::NullRelease`]), was superseded by a later
    /// acquire ([`PoolError::StaleHandle`]), or was already released
    /// ([`PoolError::DoubleRelease`]).
    pub fn release(&mut self, handle: &InstanceHandle) -> PoolResult<()> {
        let result = self.try_release(handle);
        result.map_err(|err| self.report(err))
    }

    fn try_release(&mut self, handle: &InstanceHandle) -> PoolResult<()> {
        let pool = self
            .pools
            .get_mut(handle.key().as_str())
            .ok_or_else(|| PoolError::NullRelease {
                key: handle.key().clone(),
                slot: handle.slot(),
            })?;

        pool.check_release(handle)?;
        let usage_duration = pool.deactivate(handle.slot())?;

        debug!(handle = %handle, ?usage_duration, "instance released");
        self.events.emit(PoolEvent::Released {
            handle: handle.clone(),
            usage_duration,
        });
        Ok(())
    }

    /// Destroy every instance under `key`, held or not.
    ///
    /// Callers must not be holding instances of `key`; their handles
    /// resolve to nothing afterwards, even once the pool is refilled. Hit,
    /// miss and reclaim counters restart from zero. Returns how many were
    /// destroyed.
    pub fn clear(&mut self, key: &str) -> PoolResult<usize> {
        let result = self.try_clear(key);
        result.map_err(|err| self.report(err))
    }

    fn try_clear(&mut self, key: &str) -> PoolResult<usize> {
        let pool = self
            .pools
            .get_mut(key)
            .ok_or_else(|| PoolError::pool_not_registered(key))?;
        let destroyed = pool.clear();

        debug!(key, destroyed, "pool cleared");
        self.events.emit(PoolEvent::Cleared {
            key: pool.key().clone(),
            destroyed,
        });
        Ok(destroyed)
    }

    /// Destroy every instance of every pool. Registrations are kept.
    pub fn clear_all(&mut self) -> usize {
        let mut total = 0;
        for pool in self.pools.values_mut() {
            let destroyed = pool.clear();
            total += destroyed;
            self.events.emit(PoolEvent::Cleared {
                key: pool.key().clone(),
                destroyed,
            });
        }
        debug!(destroyed = total, "all pools cleared");
        total
    }

    // -----------------------------------------------------------------------
    // Instance access
    // -----------------------------------------------------------------------

    /// Payload of a live handle.
    #[must_use]
    pub fn get(&self, handle: &InstanceHandle) -> Option<&T> {
        self.pools.get(handle.key().as_str())?.live(handle)
    }

    /// Mutable payload of a live handle.
    pub fn get_mut(&mut self, handle: &InstanceHandle) -> Option<&mut T> {
        self.pools.get_mut(handle.key().as_str())?.live_mut(handle)
    }

    /// Whether `handle` still owns its instance.
    ///
    /// Turns `false` on release, on a forced reclaim and on `clear`.
    #[must_use]
    pub fn is_live(&self, handle: &InstanceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Instance metadata behind `handle`, whoever holds it now.
    #[must_use]
    pub fn instance(&self, handle: &InstanceHandle) -> Option<&PooledInstance<T>> {
        self.pools.get(handle.key().as_str())?.instance(handle.slot())
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Whether a pool exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    /// Whether a factory is bound to `key`.
    #[must_use]
    pub fn has_factory(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Statistics for one pool.
    #[must_use]
    pub fn stats_for(&self, key: &str) -> Option<PoolStats> {
        self.pools.get(key).map(Pool::stats)
    }

    /// Snapshot of every registered key, sorted.
    #[must_use]
    pub fn all_keys(&self) -> Vec<PoolKey> {
        let mut keys: Vec<PoolKey> = self.pools.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of the active set of `key`, oldest acquisition first.
    #[must_use]
    pub fn active_instances(&self, key: &str) -> Option<Vec<InstanceHandle>> {
        self.pools.get(key).map(Pool::active_handles)
    }

    /// Totals across every pool.
    #[must_use]
    pub fn aggregate_perf(&self) -> PerfSnapshot {
        let mut perf = PerfSnapshot::default();
        for pool in self.pools.values() {
            perf.add(&pool.stats());
        }
        perf
    }

    /// The configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The event bus lifecycle events are published on.
    #[must_use]
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    /// Log and publish a refused operation, handing the error back.
    fn report(&self, err: PoolError) -> PoolError {
        warn!(code = err.code(), error = %err, "pool operation refused");
        self.events.emit(PoolEvent::Error {
            key: err.key().cloned(),
            code: err.code(),
            message: err.to_string(),
        });
        err
    }

    #[cfg(test)]
    pub(crate) fn pools_consistent(&self) -> bool {
        self.pools.values().all(Pool::is_consistent)
    }
}

impl<T: Poolable> Default for Registry<T> {
    fn default() -> Self {
        let config = RegistryConfig::default();
        let events = Arc::new(EventBus::new(config.event_buffer));
        Self::with_parts(config, events)
    }
}

impl<T: Poolable> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pools", &self.all_keys())
            .field("factories", &self.factories.len())
            .field("initialized", &self.initialized)
            .field("saturation", &self.config.saturation)
            .finish()
    }
}
