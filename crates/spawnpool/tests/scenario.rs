//! End-to-end acquire/release scenarios for a zombie spawner.

use pretty_assertions::assert_eq;
use spawnpool::{PoolError, Poolable, Registry, RegistryConfig, SaturationPolicy};

// ---------------------------------------------------------------------------
// Test resource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f32,
    y: f32,
}

const fn at(x: f32, y: f32) -> Vec2 {
    Vec2 { x, y }
}

#[derive(Debug)]
struct Zombie {
    serial: u32,
    position: Vec2,
    health: u32,
    visible: bool,
    spawned: u32,
    despawned: u32,
}

impl Poolable for Zombie {
    type Placement = Vec2;

    fn apply_placement(&mut self, placement: &Vec2) {
        self.position = *placement;
    }

    fn on_acquire(&mut self) {
        self.health = 100;
        self.visible = true;
        self.spawned += 1;
    }

    fn on_release(&mut self) {
        self.health = 0;
        self.visible = false;
        self.despawned += 1;
    }
}

fn zombie_registry(capacity: usize) -> Registry<Zombie> {
    zombie_registry_with(RegistryConfig::default(), capacity)
}

fn zombie_registry_with(config: RegistryConfig, capacity: usize) -> Registry<Zombie> {
    use std::sync::atomic::{AtomicU32, Ordering};

    let serials = AtomicU32::new(0);
    let mut registry = Registry::new(config).unwrap();
    registry
        .register_factory(
            "Zombie",
            move || Zombie {
                serial: serials.fetch_add(1, Ordering::Relaxed),
                position: at(0.0, 0.0),
                health: 0,
                visible: false,
                spawned: 0,
                despawned: 0,
            },
            Some(capacity),
        )
        .unwrap();
    registry
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn zombie_wave_reuses_released_instance() {
    let mut registry = zombie_registry(3);
    assert_eq!(registry.warm("Zombie", 2).unwrap(), 2);

    let x = registry.acquire("Zombie", &at(1.0, 1.0)).unwrap();
    assert_eq!(registry.stats_for("Zombie").unwrap().hits, 1);

    let y = registry.acquire("Zombie", &at(2.0, 2.0)).unwrap();
    assert_eq!(registry.stats_for("Zombie").unwrap().hits, 2);
    assert!(!x.same_instance(&y));

    registry.release(&x).unwrap();

    let x_again = registry.acquire("Zombie", &at(3.0, 3.0)).unwrap();
    assert!(x_again.same_instance(&x));

    let stats = registry.stats_for("Zombie").unwrap();
    assert_eq!((stats.hits, stats.misses), (3, 0));

    let zombie = registry.get(&x_again).unwrap();
    assert_eq!(zombie.position, at(3.0, 3.0));
    assert_eq!(zombie.spawned, 2);
    assert_eq!(zombie.despawned, 1);
    assert_eq!(zombie.health, 100);
}

#[test]
fn round_trip_calls_hooks_exactly() {
    let mut registry = zombie_registry(4);

    let first = registry.acquire("Zombie", &at(0.0, 5.0)).unwrap();
    registry.release(&first).unwrap();
    let second = registry.acquire("Zombie", &at(5.0, 0.0)).unwrap();

    assert!(second.same_instance(&first));
    let zombie = registry.get(&second).unwrap();
    assert_eq!((zombie.spawned, zombie.despawned), (2, 1));
    assert_eq!(zombie.serial, 0);
}

#[test]
fn released_instance_is_reset_for_next_holder() {
    let mut registry = zombie_registry(2);

    let handle = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    registry.get_mut(&handle).unwrap().health = 3;
    registry.release(&handle).unwrap();

    let instance = registry.instance(&handle).unwrap();
    assert!(!instance.is_active());
    assert_eq!(instance.payload().health, 0);
    assert!(!instance.payload().visible);
    assert_eq!(instance.key().as_str(), "Zombie");
}

#[test]
fn hit_and_miss_accounting() {
    let mut registry = zombie_registry(10);
    registry.warm("Zombie", 5).unwrap();

    let held: Vec<_> = (0..5)
        .map(|i| registry.acquire("Zombie", &at(i as f32, 0.0)).unwrap())
        .collect();
    let stats = registry.stats_for("Zombie").unwrap();
    assert_eq!((stats.hits, stats.misses), (5, 0));

    let sixth = registry.acquire("Zombie", &at(9.0, 9.0)).unwrap();
    let stats = registry.stats_for("Zombie").unwrap();
    assert_eq!((stats.hits, stats.misses, stats.created), (5, 1, 6));
    assert!(held.iter().all(|h| !h.same_instance(&sixth)));
    assert_eq!(registry.get(&sixth).unwrap().serial, 5);
}

#[test]
fn saturated_pool_reclaims_one_instance() {
    let mut registry = zombie_registry(2);
    let a = registry.acquire("Zombie", &at(1.0, 0.0)).unwrap();
    let b = registry.acquire("Zombie", &at(2.0, 0.0)).unwrap();

    let c = registry.acquire("Zombie", &at(3.0, 0.0)).unwrap();

    let stats = registry.stats_for("Zombie").unwrap();
    assert_eq!(stats.active, 2);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.reclaims, 1);

    let recycled: Vec<_> = [&a, &b].into_iter().filter(|h| c.same_instance(h)).collect();
    assert_eq!(recycled.len(), 1);
    // Oldest holder loses its instance.
    assert!(c.same_instance(&a));
    assert!(!registry.is_live(&a));
    assert!(registry.is_live(&b));

    let zombie = registry.get(&c).unwrap();
    assert_eq!((zombie.spawned, zombie.despawned), (2, 1));
    assert_eq!(zombie.position, at(3.0, 0.0));
}

#[test]
fn reject_policy_keeps_holders() {
    let config = RegistryConfig {
        saturation: SaturationPolicy::Reject,
        ..Default::default()
    };
    let mut registry = zombie_registry_with(config, 2);
    let a = registry.acquire("Zombie", &at(1.0, 0.0)).unwrap();
    let _b = registry.acquire("Zombie", &at(2.0, 0.0)).unwrap();

    let err = registry.acquire("Zombie", &at(3.0, 0.0)).unwrap_err();
    assert!(matches!(err, PoolError::Saturated { active: 2, capacity: 2, .. }));

    registry.release(&a).unwrap();
    assert!(registry.acquire("Zombie", &at(3.0, 0.0)).is_ok());
}

#[test]
fn double_release_is_a_reported_no_op() {
    let mut registry = zombie_registry(3);
    registry.warm("Zombie", 1).unwrap();
    let handle = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();

    registry.release(&handle).unwrap();
    let before = registry.stats_for("Zombie").unwrap();

    let err = registry.release(&handle).unwrap_err();
    assert!(matches!(err, PoolError::DoubleRelease { slot, .. } if slot == handle.slot()));

    let after = registry.stats_for("Zombie").unwrap();
    assert_eq!(after, before);
    assert_eq!(registry.instance(&handle).unwrap().payload().despawned, 1);

    // The inactive store still holds the instance once: two acquires
    // must yield two different instances.
    let one = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    let two = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    assert!(!one.same_instance(&two));
}

#[test]
fn acquire_without_registration_returns_nothing() {
    let mut registry = Registry::<Zombie>::default();
    let err = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap_err();
    assert_eq!(err, PoolError::pool_not_registered("Zombie"));
    assert!(registry.stats_for("Zombie").is_none());
}

#[test]
fn introspection_snapshots() {
    let mut registry = zombie_registry(4);
    registry
        .register_factory(
            "Skeleton",
            || Zombie {
                serial: 100,
                position: at(0.0, 0.0),
                health: 0,
                visible: false,
                spawned: 0,
                despawned: 0,
            },
            Some(2),
        )
        .unwrap();

    registry.warm("Skeleton", 2).unwrap();
    let z1 = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    let z2 = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    let s1 = registry.acquire("Skeleton", &at(0.0, 0.0)).unwrap();

    let active = registry.active_instances("Zombie").unwrap();
    assert_eq!(active, vec![z1.clone(), z2.clone()]);

    registry.release(&z1).unwrap();
    // Snapshot taken earlier is unaffected.
    assert_eq!(active.len(), 2);
    assert_eq!(registry.active_instances("Zombie").unwrap(), vec![z2]);

    let perf = registry.aggregate_perf();
    assert_eq!(perf.pools, 2);
    assert_eq!(perf.total_pooled, 4);
    assert_eq!(perf.total_active, 2);
    assert_eq!((perf.hits, perf.misses), (1, 2));
    assert!(registry.is_live(&s1));

    let keys: Vec<_> = registry.all_keys().iter().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["Skeleton", "Zombie"]);
}

#[test]
fn clear_all_destroys_every_instance() {
    let mut registry = zombie_registry(4);
    registry.warm("Zombie", 3).unwrap();
    let held = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();

    assert_eq!(registry.clear_all(), 3);

    let stats = registry.stats_for("Zombie").unwrap();
    assert_eq!((stats.inactive, stats.active, stats.total), (0, 0, 0));
    assert_eq!(stats.destroyed, 3);
    assert!(!registry.is_live(&held));

    // Registration survives; a new instance is built on demand.
    let fresh = registry.acquire("Zombie", &at(0.0, 0.0)).unwrap();
    assert_eq!(registry.get(&fresh).unwrap().serial, 3);
}
