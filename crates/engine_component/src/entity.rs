//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight `u64` identifier with no inherent data.
//! Identifiers are handed out by the [`Registry`](crate::Registry) and are
//! never reused once destroyed.

use serde::{Deserialize, Serialize};

use crate::sparse_set::SparseId;

/// A unique entity identifier.
///
/// Entities are pure identifiers — they carry no data of their own. Components
/// are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The null / invalid entity sentinel.
    pub const INVALID: Entity = Entity(0);

    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl SparseId for Entity {
    #[inline]
    fn to_index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        Self(index as u64)
    }
}

/// Allocates monotonically increasing entity IDs.
///
/// IDs start at 1 and are never recycled. Running past `u64::MAX` is a
/// documented limit rather than a runtime condition; [`EntityAllocator::try_allocate`]
/// reports it instead of wrapping.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. IDs start at 1 (0 is reserved for [`Entity::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh entity ID, or `None` once the ID space is used up.
    pub fn try_allocate(&mut self) -> Option<Entity> {
        let id = self.next_id;
        self.next_id = id.checked_add(1)?;
        Some(Entity(id))
    }

    /// Returns the number of entities allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }

    /// Returns the ID the next allocation will hand out.
    #[must_use]
    pub fn peek(&self) -> Entity {
        Entity(self.next_id)
    }

    /// Rewinds the counter so the next allocation is `Entity(1)` again.
    pub fn reset(&mut self) {
        self.next_id = 1;
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
