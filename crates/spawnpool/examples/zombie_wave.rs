//! Zombie wave example
//!
//! Spawns waves of zombies from a small pool, lets some of them die between
//! waves and prints how often the pool could reuse an instance.
//!
//! Run with `RUST_LOG=spawnpool=debug` to see every acquire and release.

use spawnpool::prelude::*;
use spawnpool::PoolEvent;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
    "default_capacity": 32,
    "saturation": "reclaim",
    "pools": [
        { "key": "Zombie", "capacity": 8, "prewarm": 4 },
        { "key": "Skeleton", "prewarm": 2 }
    ]
}"#;

#[derive(Debug, Default)]
struct Zombie {
    x: i32,
    y: i32,
    health: u32,
}

impl Poolable for Zombie {
    type Placement = (i32, i32);

    fn apply_placement(&mut self, &(x, y): &(i32, i32)) {
        self.x = x;
        self.y = y;
    }

    fn on_acquire(&mut self) {
        self.health = 100;
    }

    fn on_release(&mut self) {
        self.health = 0;
    }
}

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spawnpool=info")),
        )
        .init();

    println!("=== Zombie Wave Example ===\n");

    let mut registry = Registry::<Zombie>::new(RegistryConfig::from_json_str(CONFIG)?)?;
    let mut events = registry.subscribe();

    // Bind the factory before initialize so Zombie is pre-warmed.
    // Skeleton has no factory; its pre-warm is reported and skipped.
    registry.register_factory("Zombie", Zombie::default, None)?;
    registry.initialize()?;

    let mut horde: Vec<InstanceHandle> = Vec::new();
    for wave in 0..4 {
        for i in 0..5 {
            let handle = registry.acquire("Zombie", &(wave * 10, i))?;
            horde.push(handle);
        }

        // Every other zombie in the horde falls.
        let mut index = 0;
        horde.retain(|handle| {
            index += 1;
            if index % 2 == 0 {
                // Reclaimed zombies were already taken back by the pool.
                let _ = registry.release(handle);
                false
            } else {
                true
            }
        });

        let alive = horde.iter().filter(|handle| registry.is_live(handle)).count();
        println!("wave {wave}: {alive} zombies still shambling");
    }

    println!();
    for key in registry.all_keys() {
        if let Some(stats) = registry.stats_for(key.as_str()) {
            println!(
                "{key}: {}/{} active, {} parked, hit rate {:.0}%, {} reclaimed",
                stats.active,
                stats.capacity,
                stats.inactive,
                stats.hit_rate() * 100.0,
                stats.reclaims,
            );
        }
    }

    let mut reclaimed = 0;
    let mut errors = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            PoolEvent::Reclaimed { .. } => reclaimed += 1,
            PoolEvent::Error { .. } => errors += 1,
            _ => {}
        }
    }
    println!("\nevents: {reclaimed} reclaims, {errors} errors");

    registry.shutdown();
    Ok(())
}
