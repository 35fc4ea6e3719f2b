//! # engine_component
//!
//! The storage core of the ECS: where entities come from, where their
//! components live, and how several component types are queried together.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers, `0` reserved.
//! - [`SparseSet`] — paged sparse set with O(1) insert, lookup and
//!   swap-remove.
//! - [`ComponentPool`] — dense storage for one component type, driven by the
//!   registry through the type-erased [`AnyPool`] surface.
//! - [`Registry`] — owns entity identity and every pool; adds, removes and
//!   queries components.
//! - [`View`] — borrowed iteration over entities holding a [`ComponentSet`].
//!
//! ## Example
//!
//! ```rust
//! use engine_component::Registry;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Position(f32, f32);
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Velocity(f32, f32);
//!
//! let mut registry = Registry::new();
//! let e = registry.create();
//! registry.add(e, Position(0.0, 0.0));
//! registry.add(e, Velocity(1.0, 2.0));
//!
//! registry.each::<(Position, Velocity)>(|_, (position, velocity)| {
//!     position.0 += velocity.0;
//!     position.1 += velocity.1;
//! });
//!
//! assert_eq!(registry.get::<Position>(e), Some(&Position(1.0, 2.0)));
//! ```
//!
//! The registry is single-threaded and performs no locking; callers serialize
//! access.

pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod pool;
pub mod query;
pub mod registry;
pub mod sparse_set;
pub mod view;

pub use component::{Component, ComponentTypeId};
pub use config::RegistryConfig;
pub use entity::{Entity, EntityAllocator};
pub use error::EcsError;
pub use pool::{AnyPool, ComponentPool};
pub use query::ComponentSet;
pub use registry::Registry;
pub use sparse_set::{DEFAULT_PAGE_SIZE, SparseId, SparseSet};
pub use view::{View, ViewIter};
