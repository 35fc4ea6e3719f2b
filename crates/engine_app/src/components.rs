//! Components used by the simulation.

use glam::Vec2;

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

/// Ticks left before the entity is despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub remaining: u32,
}

impl Lifetime {
    /// Counts one tick down. Returns `true` once the lifetime has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}
