//! # ECS Error Types
//!
//! Recoverable failures of the entity store. Programming errors (bitmask
//! index out of range, mismatched mask widths, double slot release) are not
//! represented here: they panic at the call site.

use thiserror::Error;

use crate::ecs::{ComponentKind, EntityId};

/// Errors that can occur while registering, creating or accessing entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// More component kinds were registered than the world can address.
    #[error("component capacity exceeded: at most {max} kinds can be registered")]
    CapacityExceeded {
        /// The configured ceiling.
        max: usize,
    },

    /// The entity id is invalid, removed, or from an earlier generation.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The entity is alive but its archetype does not store this kind.
    #[error("entity {entity} has no component {kind}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: EntityId,
        /// The missing component kind.
        kind: ComponentKind,
    },

    /// The component kind was never registered with this world.
    #[error("component {0} is not registered")]
    UnregisteredComponent(ComponentKind),

    /// Payload length does not match the registered size of the kind.
    #[error("size mismatch for component {kind}: registered {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The component kind.
        kind: ComponentKind,
        /// Registered size in bytes.
        expected: usize,
        /// Size that was supplied.
        actual: usize,
    },

    /// A typed view over column bytes could not be formed.
    #[error("cannot view component {kind} as the requested type: {reason}")]
    Layout {
        /// The component kind.
        kind: ComponentKind,
        /// What went wrong.
        reason: String,
    },

    /// Invalid world configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = EcsError::SizeMismatch {
            kind: ComponentKind::from_index(3),
            expected: 12,
            actual: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("12"));
        assert!(msg.contains('8'));

        let err = EcsError::EntityNotFound(EntityId::new(7, 2));
        assert_eq!(err.to_string(), "entity not found: 7v2");
    }
}
