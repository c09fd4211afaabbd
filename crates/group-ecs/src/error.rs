//! Error types for the recoverable failures at the library boundary.
//!
//! Everything else (wrong-typed column access, stale handles, unsorted ids)
//! is a programmer error and panics with a message naming the broken
//! precondition.

use thiserror::Error;

/// Errors returned by the component registry and the world facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The component type was used before it was registered.
    #[error("component `{name}` is not registered")]
    UnregisteredComponent {
        /// Type name of the component.
        name: &'static str,
    },

    /// The component type was registered twice in the same registry.
    #[error("component `{name}` is already registered")]
    AlreadyRegistered {
        /// Type name of the component.
        name: &'static str,
    },

    /// The entity does not have the component the operation needs.
    #[error("entity has no `{name}` component")]
    MissingComponent {
        /// Type name of the component.
        name: &'static str,
    },

    /// The operation would leave an entity without any component.
    #[error("an entity must keep at least one component")]
    EmptyArchetype,
}

/// Result type for fallible ECS operations.
pub type Result<T, E = EcsError> = std::result::Result<T, E>;
