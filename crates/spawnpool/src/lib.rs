//! # spawnpool
//!
//! Keyed object pools for spawn/despawn-heavy simulations.
//!
//! A [`Registry`] owns one pool per [`PoolKey`]. Each pool has a factory, a
//! hard capacity, a LIFO store of parked instances and an ordered set of
//! active ones. Callers borrow instances through [`InstanceHandle`]s
//! between `acquire` and `release`; the registry alone creates and
//! destroys them.
//!
//! ## Quick Start
//!
//! ```rust
//! use spawnpool::prelude::*;
//!
//! #[derive(Default)]
//! struct Zombie {
//!     position: (f32, f32),
//!     alive: bool,
//! }
//!
//! impl Poolable for Zombie {
//!     type Placement = (f32, f32);
//!
//!     fn apply_placement(&mut self, at: &(f32, f32)) {
//!         self.position = *at;
//!     }
//!
//!     fn on_acquire(&mut self) {
//!         self.alive = true;
//!     }
//!
//!     fn on_release(&mut self) {
//!         self.alive = false;
//!     }
//! }
//!
//! let mut registry = Registry::<Zombie>::default();
//! registry.register_factory("Zombie", Zombie::default, Some(3))?;
//! registry.warm("Zombie", 2)?;
//!
//! let zombie = registry.acquire("Zombie", &(1.0, 2.0))?;
//! registry.release(&zombie)?;
//! # Ok::<(), PoolError>(())
//! ```
//!
//! ## Saturation
//!
//! When a pool already has `capacity` active instances, the default
//! [`SaturationPolicy::Reclaim`] force-releases the longest-held one and
//! hands it to the new caller. The previous holder is not told; its handle
//! simply stops resolving (see [`Registry::is_live`]). Choose
//! [`SaturationPolicy::Reject`] to fail the acquire instead.
//!
//! ## Observability
//!
//! Operations log through `tracing` and publish [`PoolEvent`]s on an
//! [`EventBus`]. Installing a subscriber is up to the host.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod events;
pub mod key;
pub mod lifecycle;
pub mod pool;
pub mod poolable;
pub mod registry;
pub mod shared;
pub mod stats;

pub use config::{DEFAULT_CAPACITY, PoolSpec, RegistryConfig, SaturationPolicy};
pub use error::{PoolError, PoolResult};
pub use events::{EventBus, PoolEvent};
pub use key::{InstanceHandle, PoolKey};
pub use lifecycle::InstanceState;
pub use pool::PooledInstance;
pub use poolable::{Factory, Poolable};
pub use registry::Registry;
pub use shared::SharedRegistry;
pub use stats::{PerfSnapshot, PoolStats};

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{PoolSpec, RegistryConfig, SaturationPolicy};
    pub use crate::error::{PoolError, PoolResult};
    pub use crate::key::{InstanceHandle, PoolKey};
    pub use crate::poolable::{Factory, Poolable};
    pub use crate::registry::Registry;
    pub use crate::shared::SharedRegistry;
}
