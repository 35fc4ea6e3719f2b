//! Component sets and query planning.
//!
//! A [`ComponentSet`] is a tuple of component types, `(A,)` through
//! `(A, B, C, D, E, F, G, H)`, naming what a query or view wants. The
//! planner picks the requested pool with the fewest entries as the driver
//! and filters its entities by membership in the others.

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::pool::{AnyPool, ComponentPool};
use crate::registry::Registry;

/// A tuple of component types requested together.
pub trait ComponentSet: 'static {
    /// One shared pool borrow per requested type.
    type Pools<'r>: Copy;
    /// One shared component borrow per requested type.
    type Refs<'r>;
    /// One exclusive component borrow per requested type.
    type Muts<'r>;

    /// The requested component types, in tuple order.
    fn type_ids() -> Vec<ComponentTypeId>;

    /// Returns `true` if `entity` holds every requested component.
    fn held_by(registry: &Registry, entity: Entity) -> bool;

    /// Borrows every requested pool, or `None` if one was never created.
    fn fetch_pools(registry: &Registry) -> Option<Self::Pools<'_>>;

    /// Views the typed pools through their type-erased surface.
    fn erase<'r>(pools: Self::Pools<'r>) -> Vec<&'r dyn AnyPool>;

    /// Resolves every requested component of `entity`, or `None` if any is
    /// missing.
    fn fetch<'r>(pools: Self::Pools<'r>, entity: Entity) -> Option<Self::Refs<'r>>;

    /// Calls `visit` once for every entity holding all requested components,
    /// with exclusive access to those components.
    ///
    /// Creates missing pools, then drives iteration from a snapshot of the
    /// smallest pool's entities.
    fn for_each_mut<V>(registry: &mut Registry, visit: V)
    where
        V: FnMut(Entity, Self::Muts<'_>);
}

/// Picks the pool with the fewest entries.
#[must_use]
pub fn select_driver<'r>(pools: &[&'r dyn AnyPool]) -> Option<&'r dyn AnyPool> {
    pools.iter().copied().min_by_key(|pool| pool.len())
}

/// Panics if a component type is requested more than once.
fn assert_distinct(ids: &[ComponentTypeId]) {
    for (i, id) in ids.iter().enumerate() {
        assert!(
            !ids[i + 1..].contains(id),
            "component type {id} requested more than once in the same query"
        );
    }
}

macro_rules! impl_component_set {
    ($(($t:ident, $v:ident)),+) => {
        impl<$($t: Component),+> ComponentSet for ($($t,)+) {
            type Pools<'r> = ($(&'r ComponentPool<$t>,)+);
            type Refs<'r> = ($(&'r $t,)+);
            type Muts<'r> = ($(&'r mut $t,)+);

            fn type_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$t>()),+]
            }

            fn held_by(registry: &Registry, entity: Entity) -> bool {
                $(registry.has::<$t>(entity))&&+
            }

            fn fetch_pools(registry: &Registry) -> Option<Self::Pools<'_>> {
                Some(($(registry.pool::<$t>()?,)+))
            }

            fn erase<'r>(pools: Self::Pools<'r>) -> Vec<&'r dyn AnyPool> {
                let ($($v,)+) = pools;
                vec![$($v as &dyn AnyPool),+]
            }

            fn fetch<'r>(pools: Self::Pools<'r>, entity: Entity) -> Option<Self::Refs<'r>> {
                let ($($v,)+) = pools;
                Some(($($v.get_component(entity)?,)+))
            }

            fn for_each_mut<V>(registry: &mut Registry, mut visit: V)
            where
                V: FnMut(Entity, Self::Muts<'_>),
            {
                let ids = [$(ComponentTypeId::of::<$t>()),+];
                assert_distinct(&ids);
                $(registry.pool_mut::<$t>();)+

                let driver: Vec<Entity> = match Self::fetch_pools(registry)
                    .and_then(|pools| select_driver(&Self::erase(pools)))
                {
                    Some(pool) => pool.entities().to_vec(),
                    None => return,
                };
                if driver.is_empty() {
                    return;
                }

                let [$($v),+] = registry.pools_disjoint_mut(ids);
                $(
                    let Some($v) = $v.and_then(|pool| {
                        pool.as_any_mut().downcast_mut::<ComponentPool<$t>>()
                    }) else {
                        return;
                    };
                )+

                for entity in driver {
                    if let ($(Some($v),)+) = ($($v.get_component_mut(entity),)+) {
                        visit(entity, ($($v,)+));
                    }
                }
            }
        }
    };
}

impl_component_set!((A, a));
impl_component_set!((A, a), (B, b));
impl_component_set!((A, a), (B, b), (C, c));
impl_component_set!((A, a), (B, b), (C, c), (D, d));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f), (G, g), (H, h));
