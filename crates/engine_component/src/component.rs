//! Core [`Component`] trait and component type identity.
//!
//! Component registration is implicit: every `'static` type is a component,
//! and its pool is created the first time the registry sees it.

use std::any::TypeId;
use std::fmt;

/// A unique identifier for a component type.
///
/// Wraps the Rust [`TypeId`] together with the type's name so that pools can
/// be keyed by identity and still report something readable in logs.
#[derive(Clone, Copy)]
pub struct ComponentTypeId {
    id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Returns the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The fully qualified type name, e.g. `"my_game::Position"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// Identity is the TypeId alone; the name is only carried for diagnostics.
impl PartialEq for ComponentTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentTypeId {}

impl std::hash::Hash for ComponentTypeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentTypeId").field(&self.name).finish()
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The core component trait.
///
/// Any `'static` type is a component; there is nothing to implement. The trait
/// exists so that bounds across the crate read as intent rather than as a
/// bare lifetime.
///
/// # Examples
///
/// ```rust
/// use engine_component::{Component, ComponentTypeId};
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// fn id_of<T: Component>() -> ComponentTypeId {
///     ComponentTypeId::of::<T>()
/// }
///
/// assert!(id_of::<Health>().name().ends_with("Health"));
/// ```
pub trait Component: 'static {
    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId
    where
        Self: Sized,
    {
        ComponentTypeId::of::<Self>()
    }
}

impl<T: 'static> Component for T {}
