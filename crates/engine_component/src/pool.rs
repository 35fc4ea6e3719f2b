//! Per-type component storage.
//!
//! A [`ComponentPool<T>`] owns every live `T` in a registry. The registry
//! holds pools of many types side by side as `Box<dyn AnyPool>`, and only
//! talks to them through that type-erased surface unless it knows `T`.

use std::any::Any;

use crate::component::Component;
use crate::entity::Entity;
use crate::sparse_set::{DEFAULT_PAGE_SIZE, SparseSet};

/// The type-erased control surface every component pool exposes.
pub trait AnyPool: Any {
    /// Removes the entity's component, if it has one.
    fn remove_component(&mut self, entity: Entity);

    /// Returns `true` if the entity has a component in this pool.
    fn has_component(&self, entity: Entity) -> bool;

    /// Drops every stored component. The pool itself stays registered.
    fn dispose(&mut self);

    /// Entities holding a component, in dense order.
    fn entities(&self) -> &[Entity];

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Returns `true` if the pool stores nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the stored component type.
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting back to the concrete `ComponentPool<T>`.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart of [`AnyPool::as_any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for every `T` attached to an entity.
#[derive(Debug, Clone)]
pub struct ComponentPool<T> {
    set: SparseSet<T, Entity>,
}

impl<T: Component> ComponentPool<T> {
    /// Creates an empty pool using the default page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty pool whose sparse pages cover `page_size` entities.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            set: SparseSet::with_page_size(page_size),
        }
    }

    /// Attaches `value` to `entity`, replacing any existing `T`.
    pub fn add_component(&mut self, entity: Entity, value: T) -> &mut T {
        self.set.put(entity, value)
    }

    /// Detaches and returns the entity's `T`, if any.
    pub fn remove_component(&mut self, entity: Entity) -> Option<T> {
        self.set.remove(entity)
    }

    /// Returns `true` if the entity has a `T`.
    #[must_use]
    pub fn has_component(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    /// Returns the entity's `T`.
    #[must_use]
    pub fn get_component(&self, entity: Entity) -> Option<&T> {
        self.set.get(entity)
    }

    /// Returns the entity's `T` mutably.
    #[must_use]
    pub fn get_component_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.set.get_mut(entity)
    }

    /// Calls `f` on every stored value in dense order.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut T)) {
        for value in self.set.elements_mut() {
            f(value);
        }
    }

    /// Iterates `(entity, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.set.iter()
    }

    /// Entities holding a `T`, in dense order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.set.dense()
    }

    /// Number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if no entity holds a `T`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// The underlying sparse set.
    #[must_use]
    pub fn storage(&self) -> &SparseSet<T, Entity> {
        &self.set
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> AnyPool for ComponentPool<T> {
    fn remove_component(&mut self, entity: Entity) {
        self.set.remove(entity);
    }

    fn has_component(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    fn dispose(&mut self) {
        self.set.clear();
    }

    fn entities(&self) -> &[Entity] {
        self.set.dense()
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
