//! Event broadcasting for pool lifecycle observability.
//!
//! Provides [`PoolEvent`] variants emitted by the registry and an
//! [`EventBus`] backed by `tokio::sync::broadcast`. Emission never blocks
//! and needs no async runtime; subscribers may drain with `try_recv` or
//! await `recv` from async code.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::key::{InstanceHandle, PoolKey};

// ---------------------------------------------------------------------------
// PoolEvent
// ---------------------------------------------------------------------------

/// Events emitted during pool lifecycle operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// A factory was bound to a key.
    Registered {
        /// The pool key.
        key: PoolKey,
        /// Capacity in force after registration.
        capacity: usize,
        /// Whether an earlier binding was overwritten.
        replaced: bool,
    },
    /// Instances were constructed ahead of use.
    Warmed {
        /// The pool key.
        key: PoolKey,
        /// Number of instances built.
        created: usize,
    },
    /// An instance was handed out.
    Acquired {
        /// Handle given to the caller.
        handle: InstanceHandle,
        /// `true` when served from the inactive store.
        hit: bool,
    },
    /// An instance was given back.
    Released {
        /// Handle that was released.
        handle: InstanceHandle,
        /// How long the instance was held.
        usage_duration: Duration,
    },
    /// A saturated pool force-released an active instance.
    Reclaimed {
        /// Handle of the previous holder, now stale.
        handle: InstanceHandle,
        /// Capacity that was exceeded.
        capacity: usize,
    },
    /// Every instance under a key was destroyed.
    Cleared {
        /// The pool key.
        key: PoolKey,
        /// Number of instances destroyed.
        destroyed: usize,
    },
    /// An operation was refused.
    Error {
        /// The pool key, if the error concerns one.
        key: Option<PoolKey>,
        /// Error code, see [`PoolError::code`](crate::PoolError::code).
        code: &'static str,
        /// Human-readable error description.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast-based event bus for pool lifecycle events.
///
/// Emission is fire-and-forget: if no subscribers are listening or the
/// channel is full, events are dropped (no backpressure on the registry).
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is zero. `RegistryConfig::validate` rejects
    /// that before a registry builds its bus.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: PoolEvent) {
        // Err only means nobody is subscribed.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events emitted after this call.
    ///
    /// A subscriber that falls more than `buffer_size` events behind gets
    /// a `Lagged` error and skips to the oldest retained event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_BUFFER)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.emit(PoolEvent::Warmed {
            key: PoolKey::from("Zombie"),
            created: 2,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_receives_emitted_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(PoolEvent::Cleared {
            key: PoolKey::from("Arrow"),
            destroyed: 4,
        });

        match rx.try_recv().expect("should receive event") {
            PoolEvent::Cleared { key, destroyed } => {
                assert_eq!(key.as_str(), "Arrow");
                assert_eq!(destroyed, 4);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn multiple_subscribers_all_receive() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(PoolEvent::Error {
            key: None,
            code: "POOL:CONFIG:INVALID",
            message: "bad".to_string(),
        });

        assert!(matches!(rx1.try_recv(), Ok(PoolEvent::Error { .. })));
        assert!(matches!(rx2.try_recv(), Ok(PoolEvent::Error { .. })));
    }

    #[tokio::test]
    async fn async_subscriber_receives() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        bus.emit(PoolEvent::Warmed {
            key: PoolKey::from("Orc"),
            created: 1,
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PoolEvent::Warmed { created: 1, .. }));
    }
}
