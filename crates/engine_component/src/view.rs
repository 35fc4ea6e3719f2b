//! Read-only multi-component views.
//!
//! A [`View`] borrows the registry's pools for one [`ComponentSet`] and walks
//! the entities of the smallest of them, yielding only those that hold every
//! requested component. Each step re-resolves the entity and its components;
//! nothing is cached between steps.

use std::iter::FusedIterator;

use crate::entity::Entity;
use crate::query::{ComponentSet, select_driver};

/// A borrowed view over every entity holding all components in `Q`.
pub struct View<'r, Q: ComponentSet> {
    /// Dense entities of the driving (smallest) pool.
    driver: &'r [Entity],
    /// `None` when one of the requested pools does not exist yet.
    pools: Option<Q::Pools<'r>>,
}

impl<'r, Q: ComponentSet> View<'r, Q> {
    pub(crate) fn new(pools: Option<Q::Pools<'r>>) -> Self {
        let driver = pools
            .and_then(|pools| select_driver(&Q::erase(pools)))
            .map_or(&[][..], |pool| pool.entities());
        Self { driver, pools }
    }

    /// Population of the driving pool.
    ///
    /// This is an upper bound on the number of matches: entities in the
    /// driver that lack another requested component are still counted. It is
    /// exact for single-component views. Use [`View::count`] for the filtered
    /// number.
    #[must_use]
    pub fn len(&self) -> usize {
        self.driver.len()
    }

    /// Returns `true` if the driving pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.driver.is_empty()
    }

    /// Exact number of matching entities. O(driver size).
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// The driving entity sequence, before filtering.
    #[must_use]
    pub fn driver(&self) -> &'r [Entity] {
        self.driver
    }

    /// Resolves the requested components of `entity`, if it holds all of them.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<Q::Refs<'r>> {
        Q::fetch(self.pools?, entity)
    }

    /// Returns `true` if `entity` holds every requested component.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Calls `f` for every matching entity, in driver order.
    pub fn for_each(&self, mut f: impl FnMut(Entity, Q::Refs<'r>)) {
        for (entity, components) in self.iter() {
            f(entity, components);
        }
    }

    /// Iterates matching entities and their components.
    #[must_use]
    pub fn iter(&self) -> ViewIter<'r, Q> {
        ViewIter {
            driver: self.driver,
            pools: self.pools,
            position: 0,
        }
    }

    /// Collects the matching entities into an owned snapshot.
    ///
    /// The snapshot is detached from the registry, so it can drive a loop that
    /// adds, removes or destroys while it runs.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.iter().map(|(entity, _)| entity).collect()
    }
}

impl<'r, Q: ComponentSet> IntoIterator for View<'r, Q> {
    type Item = (Entity, Q::Refs<'r>);
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'r, Q: ComponentSet> IntoIterator for &View<'r, Q> {
    type Item = (Entity, Q::Refs<'r>);
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<Q: ComponentSet> std::fmt::Debug for View<'_, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("driver_len", &self.driver.len())
            .field("pools_present", &self.pools.is_some())
            .finish()
    }
}

/// Forward iterator over a [`View`].
pub struct ViewIter<'r, Q: ComponentSet> {
    driver: &'r [Entity],
    pools: Option<Q::Pools<'r>>,
    position: usize,
}

impl<'r, Q: ComponentSet> Iterator for ViewIter<'r, Q> {
    type Item = (Entity, Q::Refs<'r>);

    fn next(&mut self) -> Option<Self::Item> {
        let pools = self.pools?;
        while let Some(&entity) = self.driver.get(self.position) {
            self.position += 1;
            if let Some(components) = Q::fetch(pools, entity) {
                return Some((entity, components));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.driver.len().saturating_sub(self.position)))
    }
}

impl<Q: ComponentSet> FusedIterator for ViewIter<'_, Q> {}
