//! Registry error types.

use crate::entity::Entity;

/// Errors reported by the checked registry operations.
///
/// Absence is normally signalled with `Option` or `bool`; these errors are
/// for the `try_*` entry points and for configuration.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A sparse page must cover at least one identifier.
    #[error("page size must be non-zero")]
    InvalidPageSize,

    /// The entity was never created or has been destroyed.
    #[error("{0} is not alive")]
    EntityNotAlive(Entity),

    /// The entity does not hold the requested component.
    #[error("component '{component}' not found on {entity}")]
    ComponentMissing {
        /// Type name of the missing component.
        component: &'static str,
        /// The entity that was queried.
        entity: Entity,
    },

    /// Every `u64` entity identifier has been handed out.
    #[error("entity identifier space exhausted")]
    IdSpaceExhausted,

    /// A configuration document could not be parsed.
    #[error("invalid registry config: {0}")]
    Config(#[from] serde_json::Error),
}
