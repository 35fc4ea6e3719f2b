//! Fixed-timestep simulation loop.
//!
//! Each tick runs, in order:
//!
//! 1. Movement: integrate `Position` by `Velocity`.
//! 2. Expiry: count down `Lifetime` and destroy entities that run out.
//! 3. Culling: every `despawn_every` ticks, destroy the oldest living entity.
//! 4. Advance the tick counter.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use engine_component::{Entity, Registry};
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::components::{Lifetime, Position, Velocity};

/// Configuration for the simulation loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Destroy the oldest entity every this many ticks (0 = never).
    pub despawn_every: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            despawn_every: 0,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Entities whose position was integrated.
    pub moved: usize,
    /// Entities destroyed because their lifetime ran out.
    pub expired: usize,
    /// Entities destroyed by periodic culling.
    pub culled: usize,
}

/// The simulation state: a registry plus the tick counter.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    registry: Registry,
}

impl TickLoop {
    /// Create a new tick loop around an existing registry.
    #[must_use]
    pub fn new(config: TickConfig, registry: Registry) -> Self {
        Self {
            tick_id: 0,
            config,
            registry,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Spawn `count` entities laid out along the x axis.
    ///
    /// Every entity gets a `Position`. Even-indexed entities move; every third
    /// entity has a short `Lifetime`.
    pub fn populate(&mut self, count: usize) -> Vec<Entity> {
        let mut spawned = Vec::with_capacity(count);
        for i in 0..count {
            let entity = self.registry.create();
            self.registry.add(entity, Position(Vec2::new(i as f32, 0.0)));
            if i % 2 == 0 {
                let drift = (i % 3) as f32 - 1.0;
                self.registry.add(entity, Velocity(Vec2::new(1.0, drift)));
            }
            if i % 3 == 0 {
                self.registry.add(
                    entity,
                    Lifetime {
                        remaining: 3 + (i % 5) as u32,
                    },
                );
            }
            spawned.push(entity);
        }
        info!(
            count,
            living = self.registry.len(),
            pools = self.registry.pool_count(),
            "populated registry"
        );
        spawned
    }

    /// Run one tick of the simulation.
    pub fn tick(&mut self, dt: f64) -> TickStats {
        self.tick_id += 1;
        let mut stats = TickStats::default();
        let step = dt as f32;

        self.registry
            .each::<(Position, Velocity)>(|_, (position, velocity)| {
                position.0 += velocity.0 * step;
                stats.moved += 1;
            });

        self.registry.each_entity::<(Lifetime,)>(|registry, entity| {
            let ran_out = registry
                .get_mut::<Lifetime>(entity)
                .is_some_and(|lifetime| lifetime.tick());
            if ran_out {
                registry.destroy(entity);
                stats.expired += 1;
            }
        });

        if self.config.despawn_every > 0
            && self.tick_id % self.config.despawn_every == 0
            && let Some(&oldest) = self.registry.alive().first()
        {
            self.registry.destroy(oldest);
            stats.culled += 1;
        }

        debug!(
            tick_id = self.tick_id,
            dt,
            moved = stats.moved,
            expired = stats.expired,
            culled = stats.culled,
            living = self.registry.len(),
            "tick complete"
        );
        stats
    }

    /// Run the loop for the configured number of ticks, or indefinitely.
    ///
    /// Blocks the calling thread, sleeping out the remainder of each tick.
    /// Fails without ticking if the tick rate is not a positive number.
    pub fn run(&mut self) -> Result<()> {
        let tick_rate = self.config.tick_rate;
        if !(tick_rate.is_finite() && tick_rate > 0.0) {
            bail!("tick rate must be a positive number, got {tick_rate}");
        }
        let tick_duration = Duration::try_from_secs_f64(1.0 / tick_rate)
            .with_context(|| format!("tick rate {tick_rate} is too small"))?;
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(
                    ticks = tick_count,
                    living = self.registry.len(),
                    "tick loop complete"
                );
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RegistryConfig;

    use super::*;

    fn new_loop(config: TickConfig) -> TickLoop {
        TickLoop::new(config, Registry::new())
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut tick_loop = new_loop(TickConfig::default());
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(1.0 / 60.0);
        assert_eq!(tick_loop.tick_id(), 1);
        tick_loop.tick(1.0 / 60.0);
        assert_eq!(tick_loop.tick_id(), 2);
    }

    #[test]
    fn test_populate_attaches_components() {
        let mut tick_loop = new_loop(TickConfig::default());
        let spawned = tick_loop.populate(6);
        let registry = tick_loop.registry();

        assert_eq!(registry.len(), 6);
        assert_eq!(registry.view::<(Position,)>().len(), 6);
        assert_eq!(registry.view::<(Velocity,)>().len(), 3);
        assert!(registry.has::<Lifetime>(spawned[0]));
        assert!(registry.has::<Lifetime>(spawned[3]));
        assert!(!registry.has::<Velocity>(spawned[1]));
    }

    #[test]
    fn test_movement_integrates_velocity() {
        let mut tick_loop = new_loop(TickConfig::default());
        let spawned = tick_loop.populate(3);

        let stats = tick_loop.tick(0.5);
        assert_eq!(stats.moved, 2);

        let registry = tick_loop.registry();
        // Index 0: velocity (1, -1), index 1: static, index 2: velocity (1, 1).
        assert_eq!(
            registry.get::<Position>(spawned[0]),
            Some(&Position(Vec2::new(0.5, -0.5)))
        );
        assert_eq!(
            registry.get::<Position>(spawned[1]),
            Some(&Position(Vec2::new(1.0, 0.0)))
        );
        assert_eq!(
            registry.get::<Position>(spawned[2]),
            Some(&Position(Vec2::new(2.5, 0.5)))
        );
    }

    #[test]
    fn test_lifetimes_expire() {
        let mut tick_loop = new_loop(TickConfig::default());
        let spawned = tick_loop.populate(1);
        // Index 0 lives for 3 ticks.
        assert_eq!(tick_loop.tick(0.1).expired, 0);
        assert_eq!(tick_loop.tick(0.1).expired, 0);
        assert_eq!(tick_loop.tick(0.1).expired, 1);
        assert!(!tick_loop.registry().valid(spawned[0]));
        assert!(!tick_loop.registry().has::<Position>(spawned[0]));
    }

    #[test]
    fn test_despawn_every_culls_oldest() {
        let mut tick_loop = new_loop(TickConfig {
            despawn_every: 2,
            ..TickConfig::default()
        });
        let spawned = tick_loop.populate(5);

        assert_eq!(tick_loop.tick(0.0).culled, 0);
        let stats = tick_loop.tick(0.0);
        assert_eq!(stats.culled, 1);
        assert!(!tick_loop.registry().valid(spawned[0]));
        assert!(tick_loop.registry().valid(spawned[1]));
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
            despawn_every: 0,
        };
        let registry = Registry::with_config(RegistryConfig::new().with_page_size(16)).unwrap();
        let mut tick_loop = TickLoop::new(config, registry);
        tick_loop.populate(10);
        tick_loop.run().unwrap();
        assert_eq!(tick_loop.tick_id(), 5);
    }

    #[test]
    fn test_run_rejects_bad_tick_rates() {
        for tick_rate in [0.0, -30.0, f64::NAN, f64::INFINITY, 1e-320] {
            let mut tick_loop = new_loop(TickConfig {
                tick_rate,
                max_ticks: 1,
                despawn_every: 0,
            });
            assert!(tick_loop.run().is_err());
            assert_eq!(tick_loop.tick_id(), 0);
        }
    }
}
