//! The entity registry.
//!
//! The [`Registry`] is the single owner of entity identity and of every
//! component pool. Pools are created lazily, one per component type, the
//! first time a type is written.
//!
//! ## Entity lifecycle
//!
//! ```text
//! Unallocated --create--> Live --destroy--> Destroyed (terminal)
//! ```
//!
//! Identifiers come from a monotonically increasing counter starting at 1 and
//! are never reused, so the living sequence is sorted by construction.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::component::{Component, ComponentTypeId};
use crate::config::RegistryConfig;
use crate::entity::{Entity, EntityAllocator};
use crate::error::EcsError;
use crate::pool::{AnyPool, ComponentPool};
use crate::query::ComponentSet;
use crate::view::View;

/// Owns entities and their components.
pub struct Registry {
    /// One pool per component type ever written.
    pools: HashMap<ComponentTypeId, Box<dyn AnyPool>>,
    /// Living entities in creation order (and therefore ascending).
    living: Vec<Entity>,
    allocator: EntityAllocator,
    config: RegistryConfig,
}

impl Registry {
    /// Create a new, empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(RegistryConfig::default())
    }

    /// Create a new, empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Result<Self, EcsError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RegistryConfig) -> Self {
        Self {
            pools: HashMap::new(),
            living: Vec::new(),
            allocator: EntityAllocator::new(),
            config,
        }
    }

    /// The configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -- Entity lifecycle --

    /// Allocate a new entity with no components.
    ///
    /// # Panics
    ///
    /// Panics once the `u64` identifier space is exhausted. Use
    /// [`Registry::try_create`] to observe that limit instead.
    pub fn create(&mut self) -> Entity {
        match self.try_create() {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    /// Allocate a new entity, reporting identifier exhaustion as an error.
    pub fn try_create(&mut self) -> Result<Entity, EcsError> {
        let entity = self
            .allocator
            .try_allocate()
            .ok_or(EcsError::IdSpaceExhausted)?;
        self.living.push(entity);
        trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Destroy an entity, removing it from every pool.
    ///
    /// Every pool is asked, since the registry does not track which pools an
    /// entity belongs to. Destroying an entity that is not alive is a no-op.
    pub fn destroy(&mut self, entity: Entity) {
        for pool in self.pools.values_mut() {
            pool.remove_component(entity);
        }
        if let Ok(index) = self.living.binary_search(&entity) {
            self.living.remove(index);
            trace!(%entity, "entity destroyed");
        }
    }

    /// Returns `true` if the entity was created and not yet destroyed.
    #[must_use]
    pub fn valid(&self, entity: Entity) -> bool {
        self.living.binary_search(&entity).is_ok()
    }

    /// Living entities in creation order.
    #[must_use]
    pub fn alive(&self) -> &[Entity] {
        &self.living
    }

    /// Returns the number of living entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.living.len()
    }

    /// Returns `true` if no entity is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.living.is_empty()
    }

    // -- Pools --

    /// Returns the pool for `T`, if it has been created.
    #[must_use]
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&ComponentTypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    /// Returns the pool for `T`, creating it on first use.
    pub fn pool_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        let type_id = ComponentTypeId::of::<T>();
        let page_size = self.config.page_size;
        let pool = self.pools.entry(type_id).or_insert_with(|| {
            debug!(component = type_id.name(), page_size, "creating component pool");
            Box::new(ComponentPool::<T>::with_page_size(page_size))
        });
        match pool.as_any_mut().downcast_mut::<ComponentPool<T>>() {
            Some(pool) => pool,
            None => unreachable!("pool registered for {type_id} holds another type"),
        }
    }

    fn existing_pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&ComponentTypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    /// Exclusive access to several distinct pools at once.
    pub(crate) fn pools_disjoint_mut<const N: usize>(
        &mut self,
        ids: [ComponentTypeId; N],
    ) -> [Option<&mut Box<dyn AnyPool>>; N] {
        self.pools.get_disjoint_mut(ids.each_ref())
    }

    /// Number of component pools created so far.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    // -- Component operations --

    /// Attach `value` to `entity`, replacing any existing `T`.
    ///
    /// The entity is not checked for liveness; see [`Registry::try_add`].
    pub fn add<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.pool_mut::<T>().add_component(entity, value)
    }

    /// Attach `value` to a living `entity`.
    pub fn try_add<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        if !self.valid(entity) {
            return Err(EcsError::EntityNotAlive(entity));
        }
        Ok(self.add(entity, value))
    }

    /// Detach and return the entity's `T`, if any.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.pool_mut::<T>().remove_component(entity)
    }

    /// Returns `true` if the entity has a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>()
            .is_some_and(|pool| pool.has_component(entity))
    }

    /// Returns `true` if the entity has every component in `Q`.
    #[must_use]
    pub fn has_all<Q: ComponentSet>(&self, entity: Entity) -> bool {
        Q::held_by(self, entity)
    }

    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.get_component(entity)
    }

    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.existing_pool_mut::<T>()?.get_component_mut(entity)
    }

    /// Like [`Registry::get`], but reports a missing component as an error.
    pub fn component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.get::<T>(entity).ok_or(EcsError::ComponentMissing {
            component: std::any::type_name::<T>(),
            entity,
        })
    }

    // -- Queries --

    /// Calls `f` for every entity holding all components in `Q`, with
    /// exclusive access to them.
    ///
    /// The smallest requested pool drives the iteration. If any requested pool
    /// is empty, `f` is never called.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn each<Q: ComponentSet>(&mut self, f: impl FnMut(Entity, Q::Muts<'_>)) {
        Q::for_each_mut(self, f);
    }

    /// A read-only view over every entity holding all components in `Q`.
    #[must_use]
    pub fn view<Q: ComponentSet>(&self) -> View<'_, Q> {
        View::new(Q::fetch_pools(self))
    }

    /// Calls `f` with the registry itself for every entity holding all
    /// components in `Q`.
    ///
    /// Iteration walks a snapshot of the driving pool taken up front, and
    /// membership is re-checked right before each call, so `f` may destroy
    /// entities or add and remove components. Entities that stop matching
    /// before they are reached are skipped; entities that start matching
    /// during the walk are not visited.
    pub fn each_entity<Q: ComponentSet>(&mut self, mut f: impl FnMut(&mut Registry, Entity)) {
        let snapshot = self.view::<Q>().driver().to_vec();
        for entity in snapshot {
            if self.has_all::<Q>(entity) {
                f(self, entity);
            }
        }
    }

    // -- Teardown --

    /// Clear every pool, forget all pools and entities, and restart
    /// identifiers at 1.
    pub fn dispose(&mut self) {
        for pool in self.pools.values_mut() {
            pool.dispose();
        }
        debug!(
            pools = self.pools.len(),
            entities = self.living.len(),
            "disposing registry"
        );
        self.pools.clear();
        self.living.clear();
        self.allocator.reset();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pools: Vec<(&str, usize)> = self
            .pools
            .values()
            .map(|pool| (pool.type_name(), pool.len()))
            .collect();
        f.debug_struct("Registry")
            .field("living", &self.living.len())
            .field("next", &self.allocator.peek())
            .field("pools", &pools)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Name(&'static str);

    #[test]
    fn test_create_starts_at_one() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        let e2 = registry.create();
        assert_eq!(e1, Entity(1));
        assert_eq!(e2, Entity(2));
        assert!(e1.is_valid());
        assert_eq!(registry.alive(), &[e1, e2]);
    }

    #[test]
    fn test_valid_follows_lifecycle() {
        let mut registry = Registry::new();
        let e = registry.create();
        assert!(registry.valid(e));
        registry.destroy(e);
        assert!(!registry.valid(e));
        assert!(!registry.valid(Entity::INVALID));
    }

    #[test]
    fn test_entities_without_components_are_alive() {
        let mut registry = Registry::new();
        let e = registry.create();
        assert!(registry.valid(e));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.pool_count(), 0);
    }

    #[test]
    fn test_destroy_removes_from_every_pool() {
        let mut registry = Registry::new();
        let e = registry.create();
        let other = registry.create();
        registry.add(e, Position { x: 1.0, y: 1.0 });
        registry.add(e, Name("doomed"));
        registry.add(other, Position { x: 2.0, y: 2.0 });

        registry.destroy(e);

        assert!(!registry.has::<Position>(e));
        assert!(!registry.has::<Name>(e));
        assert!(!registry.has::<Velocity>(e));
        assert_eq!(
            registry.get::<Position>(other),
            Some(&Position { x: 2.0, y: 2.0 })
        );
    }

    #[test]
    fn test_destroy_twice_is_noop() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        let e2 = registry.create();
        registry.destroy(e1);
        registry.destroy(e1);
        assert_eq!(registry.alive(), &[e2]);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        registry.destroy(e1);
        let e2 = registry.create();
        assert_ne!(e1, e2);
        assert_eq!(e2, Entity(2));
    }

    #[test]
    fn test_add_get_has_remove() {
        let mut registry = Registry::new();
        let e = registry.create();

        assert!(!registry.has::<Position>(e));
        assert_eq!(registry.get::<Position>(e), None);

        registry.add(e, Position { x: 1.0, y: 2.0 });
        assert!(registry.has::<Position>(e));
        assert_eq!(registry.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));

        registry.get_mut::<Position>(e).unwrap().x = 5.0;
        assert_eq!(registry.get::<Position>(e).unwrap().x, 5.0);

        assert_eq!(registry.remove::<Position>(e), Some(Position { x: 5.0, y: 2.0 }));
        assert_eq!(registry.remove::<Position>(e), None);
        assert!(!registry.has::<Position>(e));
    }

    #[test]
    fn test_add_overwrites() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Name("first"));
        registry.add(e, Name("second"));
        assert_eq!(registry.get::<Name>(e), Some(&Name("second")));
        assert_eq!(registry.pool::<Name>().unwrap().len(), 1);
    }

    #[test]
    fn test_pools_are_created_lazily() {
        let mut registry = Registry::new();
        let e = registry.create();
        assert!(registry.pool::<Position>().is_none());
        registry.add(e, Position { x: 0.0, y: 0.0 });
        assert!(registry.pool::<Position>().is_some());
        assert_eq!(registry.pool_count(), 1);

        registry.pool_mut::<Velocity>();
        assert_eq!(registry.pool_count(), 2);
    }

    #[test]
    fn test_try_add_rejects_dead_entities() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.destroy(e);
        let err = registry.try_add(e, Name("ghost")).unwrap_err();
        assert!(matches!(err, EcsError::EntityNotAlive(dead) if dead == e));
        assert!(!registry.has::<Name>(e));

        let live = registry.create();
        assert_eq!(registry.try_add(live, Name("ok")).unwrap(), &Name("ok"));
    }

    #[test]
    fn test_component_reports_missing() {
        let mut registry = Registry::new();
        let e = registry.create();
        let err = registry.component::<Velocity>(e).unwrap_err();
        assert!(err.to_string().contains("Velocity"));
        assert!(err.to_string().contains("Entity(1)"));
    }

    #[test]
    fn test_has_all() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Position { x: 0.0, y: 0.0 });
        assert!(registry.has_all::<(Position,)>(e));
        assert!(!registry.has_all::<(Position, Velocity)>(e));
        registry.add(e, Velocity { x: 0.0, y: 0.0 });
        assert!(registry.has_all::<(Position, Velocity)>(e));
    }

    #[test]
    fn test_each_matches_exactly_the_intersection() {
        let mut registry = Registry::new();
        let mut both = Vec::new();
        for i in 0..20 {
            let e = registry.create();
            if i % 2 == 0 {
                registry.add(e, Position { x: 0.0, y: 0.0 });
            }
            if i % 3 == 0 {
                registry.add(e, Velocity { x: 1.0, y: 1.0 });
            }
            if i % 6 == 0 {
                both.push(e);
            }
        }

        let mut visited = Vec::new();
        registry.each::<(Position, Velocity)>(|entity, _| visited.push(entity));
        visited.sort();
        assert_eq!(visited, both);
    }

    #[test]
    fn test_position_velocity_scenario() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        let e2 = registry.create();
        let e3 = registry.create();
        registry.add(e1, Position { x: 1.0, y: 1.0 });
        registry.add(e2, Position { x: 2.0, y: 2.0 });
        registry.add(e3, Velocity { x: 3.0, y: 3.0 });

        let mut calls = 0;
        registry.each::<(Position, Velocity)>(|_, _| calls += 1);
        assert_eq!(calls, 0);

        registry.add(e1, Velocity { x: 0.1, y: 0.1 });

        let mut visited = Vec::new();
        registry.each::<(Position, Velocity)>(|entity, (position, velocity)| {
            position.x += velocity.x;
            position.y += velocity.y;
            visited.push(entity);
        });
        assert_eq!(visited, vec![e1]);
        assert_eq!(
            registry.get::<Position>(e1),
            Some(&Position { x: 1.1, y: 1.1 })
        );
    }

    #[test]
    fn test_each_with_empty_pool_never_calls() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Position { x: 0.0, y: 0.0 });

        let mut calls = 0;
        registry.each::<(Position, Velocity)>(|_, _| calls += 1);
        assert_eq!(calls, 0);
        // The query created the missing pool on demand.
        assert!(registry.pool::<Velocity>().is_some());
    }

    #[test]
    fn test_each_drives_from_smallest_pool() {
        let mut registry = Registry::new();
        for _ in 0..50 {
            let e = registry.create();
            registry.add(e, Position { x: 0.0, y: 0.0 });
        }
        let tagged = registry.create();
        registry.add(tagged, Position { x: 0.0, y: 0.0 });
        registry.add(tagged, Name("only"));

        let view = registry.view::<(Position, Name)>();
        assert_eq!(view.driver(), &[tagged]);

        let mut visited = Vec::new();
        registry.each::<(Name, Position)>(|entity, _| visited.push(entity));
        assert_eq!(visited, vec![tagged]);
    }

    #[test]
    fn test_destroy_during_each_entity_visits_remaining() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        let e2 = registry.create();
        registry.add(e1, Position { x: 1.0, y: 1.0 });
        registry.add(e2, Position { x: 2.0, y: 2.0 });

        let mut visited = Vec::new();
        registry.each_entity::<(Position,)>(|registry, entity| {
            visited.push(entity);
            if entity == e1 {
                registry.destroy(e1);
            }
        });

        assert_eq!(visited, vec![e1, e2]);
        assert!(!registry.valid(e1));
        assert_eq!(registry.view::<(Position,)>().entities(), vec![e2]);
    }

    #[test]
    fn test_each_entity_skips_entities_destroyed_ahead() {
        let mut registry = Registry::new();
        let e1 = registry.create();
        let e2 = registry.create();
        registry.add(e1, Position { x: 1.0, y: 1.0 });
        registry.add(e2, Position { x: 2.0, y: 2.0 });

        let mut visited = Vec::new();
        registry.each_entity::<(Position,)>(|registry, entity| {
            visited.push(entity);
            registry.destroy(e2);
        });

        assert_eq!(visited, vec![e1]);
        assert!(registry.valid(e1));
    }

    #[test]
    fn test_swap_removal_reorders_driving_pool() {
        // Removing from a pool relocates its last entity into the hole, which
        // is why iteration that destroys as it goes walks a snapshot.
        let mut registry = Registry::new();
        let entities: Vec<Entity> = (0..3).map(|_| registry.create()).collect();
        for &e in &entities {
            registry.add(e, Position { x: 0.0, y: 0.0 });
        }

        registry.destroy(entities[0]);
        let pool = registry.pool::<Position>().unwrap();
        assert_eq!(pool.entities(), &[entities[2], entities[1]]);
    }

    #[test]
    fn test_dispose_resets_everything() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Position { x: 0.0, y: 0.0 });
        registry.add(e, Name("a"));

        registry.dispose();

        assert!(registry.is_empty());
        assert_eq!(registry.pool_count(), 0);
        assert!(!registry.valid(e));
        assert!(!registry.has::<Position>(e));
        assert_eq!(registry.create(), Entity(1));
    }

    #[test]
    fn test_with_config_sets_pool_page_size() {
        let mut registry = Registry::with_config(RegistryConfig::new().with_page_size(8)).unwrap();
        let e = registry.create();
        registry.add(e, Name("paged"));
        assert_eq!(registry.pool::<Name>().unwrap().storage().page_size(), 8);
    }

    #[test]
    fn test_with_config_rejects_zero_page_size() {
        let result = Registry::with_config(RegistryConfig::new().with_page_size(0));
        assert!(matches!(result, Err(EcsError::InvalidPageSize)));
    }

    #[test]
    fn test_debug_lists_pools() {
        let mut registry = Registry::new();
        let e = registry.create();
        registry.add(e, Name("dbg"));
        let text = format!("{registry:?}");
        assert!(text.contains("Name"));
        assert!(text.contains("living: 1"));
    }
}
