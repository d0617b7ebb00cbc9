//! Per-key pool storage.
//!
//! A [`Pool`] owns every instance built under one key. Instances live in a
//! slot vector for their whole life; the inactive store is a LIFO stack of
//! slot indices and the active set keeps acquisition order, so the first
//! entry is always the longest-held instance.
//!
//! Slot numbers are never reused within a pool: `clear` moves the slot base
//! past every number handed out so far, so handles from before the clear
//! name no instance at all.

use std::time::{Duration, Instant};

use indexmap::IndexSet;

use crate::error::{PoolError, PoolResult};
use crate::key::{InstanceHandle, PoolKey};
use crate::lifecycle::InstanceState;
use crate::poolable::Poolable;
use crate::stats::PoolStats;

// ---------------------------------------------------------------------------
// PooledInstance
// ---------------------------------------------------------------------------

/// One pooled resource together with the bookkeeping the registry keeps
/// about it. Only the registry changes its state.
#[derive(Debug)]
pub struct PooledInstance<T> {
    key: PoolKey,
    slot: u32,
    state: InstanceState,
    epoch: u64,
    acquisitions: u64,
    acquired_at: Option<Instant>,
    payload: T,
}

impl<T> PooledInstance<T> {
    fn new(key: PoolKey, slot: u32, payload: T) -> Self {
        Self {
            key,
            slot,
            state: InstanceState::Uninitialized,
            epoch: 0,
            acquisitions: 0,
            acquired_at: None,
            payload,
        }
    }

    /// Key of the owning pool, fixed at construction.
    #[must_use]
    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Slot inside the owning pool.
    #[must_use]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Whether a caller currently holds the instance.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Epoch stamped by the most recent acquire; 0 if never acquired.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// How many times the instance has been acquired.
    #[must_use]
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    /// The pooled resource.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    fn transition(&mut self, next: InstanceState) -> PoolResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(PoolError::InvalidTransition {
                key: self.key.clone(),
                slot: self.slot,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Storage and counters for one key.
#[derive(Debug)]
pub(crate) struct Pool<T> {
    key: PoolKey,
    capacity: usize,
    base: u32,
    slots: Vec<PooledInstance<T>>,
    inactive: Vec<u32>,
    active: IndexSet<u32>,
    hits: u64,
    misses: u64,
    reclaims: u64,
    created: u64,
    destroyed: u64,
}

impl<T: Poolable> Pool<T> {
    pub(crate) fn new(key: PoolKey, capacity: usize) -> Self {
        Self {
            key,
            capacity,
            base: 0,
            slots: Vec::new(),
            inactive: Vec::new(),
            active: IndexSet::new(),
            hits: 0,
            misses: 0,
            reclaims: 0,
            created: 0,
            destroyed: 0,
        }
    }

    pub(crate) fn key(&self) -> &PoolKey {
        &self.key
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the bound for future acquires only; nothing is destroyed.
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn total(&self) -> usize {
        self.inactive.len() + self.active.len()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_reclaim(&mut self) {
        self.reclaims += 1;
    }

    /// Takes ownership of a freshly built payload. The instance is
    /// `Inactive` but not yet on the stack; follow with [`park`](Self::park)
    /// or [`activate`](Self::activate).
    pub(crate) fn adopt(&mut self, payload: T) -> PoolResult<u32> {
        let slot = u32::try_from(self.slots.len())
            .ok()
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(|| {
                PoolError::invalid_config(format!("pool '{}' ran out of instance slots", self.key))
            })?;
        let mut instance = PooledInstance::new(self.key.clone(), slot, payload);
        instance.transition(InstanceState::Inactive)?;
        self.slots.push(instance);
        self.created += 1;
        Ok(slot)
    }

    pub(crate) fn park(&mut self, slot: u32) {
        self.inactive.push(slot);
    }

    /// Most recently parked slot.
    pub(crate) fn pop_inactive(&mut self) -> Option<u32> {
        self.inactive.pop()
    }

    /// Longest-held active slot.
    pub(crate) fn oldest_active(&self) -> Option<u32> {
        self.active.first().copied()
    }

    /// Inactive -> Active: placement, `on_acquire`, then bookkeeping.
    pub(crate) fn activate(
        &mut self,
        slot: u32,
        epoch: u64,
        placement: &T::Placement,
    ) -> PoolResult<InstanceHandle> {
        let instance = self.slot_mut(slot)?;
        instance.transition(InstanceState::Active)?;
        instance.payload.apply_placement(placement);
        instance.payload.on_acquire();
        instance.epoch = epoch;
        instance.acquisitions += 1;
        instance.acquired_at = Some(Instant::now());

        self.active.insert(slot);
        Ok(InstanceHandle::new(self.key.clone(), slot, epoch))
    }

    /// Active -> Inactive: `on_release`, then push onto the LIFO store.
    ///
    /// Returns how long the instance was held.
    pub(crate) fn deactivate(&mut self, slot: u32) -> PoolResult<Duration> {
        let instance = self.slot_mut(slot)?;
        instance.transition(InstanceState::Inactive)?;
        instance.payload.on_release();
        let held = instance
            .acquired_at
            .take()
            .map(|at| at.elapsed())
            .unwrap_or_default();

        self.active.shift_remove(&slot);
        self.inactive.push(slot);
        Ok(held)
    }

    /// Checks that `handle` may release its instance right now.
    pub(crate) fn check_release(&self, handle: &InstanceHandle) -> PoolResult<()> {
        let Some(instance) = self.slot(handle.slot()) else {
            return Err(PoolError::NullRelease {
                key: self.key.clone(),
                slot: handle.slot(),
            });
        };
        if instance.epoch != handle.epoch() {
            return Err(PoolError::StaleHandle {
                key: self.key.clone(),
                slot: handle.slot(),
                held_epoch: handle.epoch(),
                current_epoch: instance.epoch,
            });
        }
        if !instance.is_active() {
            return Err(PoolError::DoubleRelease {
                key: self.key.clone(),
                slot: handle.slot(),
            });
        }
        Ok(())
    }

    /// Handle for whoever currently holds `slot`.
    pub(crate) fn current_handle(&self, slot: u32) -> Option<InstanceHandle> {
        self.slot(slot)
            .map(|instance| InstanceHandle::new(self.key.clone(), slot, instance.epoch))
    }

    pub(crate) fn instance(&self, slot: u32) -> Option<&PooledInstance<T>> {
        self.slot(slot)
    }

    /// Payload for a handle that still owns its instance.
    pub(crate) fn live(&self, handle: &InstanceHandle) -> Option<&T> {
        self.slot(handle.slot())
            .filter(|instance| instance.is_active() && instance.epoch == handle.epoch())
            .map(|instance| &instance.payload)
    }

    pub(crate) fn live_mut(&mut self, handle: &InstanceHandle) -> Option<&mut T> {
        let index = self.index(handle.slot())?;
        self.slots
            .get_mut(index)
            .filter(|instance| instance.is_active() && instance.epoch == handle.epoch())
            .map(|instance| &mut instance.payload)
    }

    /// Handles of every active instance, in acquisition order.
    pub(crate) fn active_handles(&self) -> Vec<InstanceHandle> {
        self.active
            .iter()
            .filter_map(|&slot| self.current_handle(slot))
            .collect()
    }

    /// Destroys every instance, held or not, and zeroes the hit, miss and
    /// reclaim counters. Returns how many instances were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let destroyed = self.slots.len();
        self.base = self.base.saturating_add(destroyed as u32);
        self.slots.clear();
        self.inactive.clear();
        self.active.clear();
        self.hits = 0;
        self.misses = 0;
        self.reclaims = 0;
        self.destroyed += destroyed as u64;
        destroyed
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            key: self.key.clone(),
            inactive: self.inactive.len(),
            active: self.active.len(),
            total: self.total(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            reclaims: self.reclaims,
            created: self.created,
            destroyed: self.destroyed,
        }
    }

    /// Every slot is in exactly one of the two stores, and each store
    /// agrees with the instance's own state.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let slots_ok = self.slots.iter().all(|instance| {
            let in_active = self.active.contains(&instance.slot);
            let in_inactive = self.inactive.contains(&instance.slot);
            match instance.state {
                InstanceState::Active => in_active && !in_inactive,
                InstanceState::Inactive => in_inactive && !in_active,
                InstanceState::Uninitialized | InstanceState::Destroyed => false,
            }
        });
        slots_ok && self.total() == self.slots.len()
    }

    fn index(&self, slot: u32) -> Option<usize> {
        slot.checked_sub(self.base).map(|offset| offset as usize)
    }

    fn slot(&self, slot: u32) -> Option<&PooledInstance<T>> {
        self.slots.get(self.index(slot)?)
    }

    fn slot_mut(&mut self, slot: u32) -> PoolResult<&mut PooledInstance<T>> {
        let key = &self.key;
        self.index(slot)
            .and_then(|index| self.slots.get_mut(index))
            .ok_or_else(|| PoolError::NullRelease {
                key: key.clone(),
                slot,
            })
    }
}
