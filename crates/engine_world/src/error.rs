//! World error types.

use engine_component::{ComponentTypeId, EntityId, GroupId, RegistryError};

/// Errors raised by world operations.
///
/// Only programmer-error conditions surface here. Expected "not found" cases
/// (despawning a dead entity, reading an absent component) are reported as
/// `false` or `None` by the operation itself.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A mutation targeted an entity that is not live.
    #[error("{0} is not live")]
    UnknownEntity(EntityId),

    /// A membership change targeted a group that does not exist.
    #[error("{0} not found")]
    UnknownGroup(GroupId),

    /// Component registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A typed value could not be encoded into the component container.
    #[error("failed to encode value for {component}: {source}")]
    Encode {
        /// The component the value was destined for.
        component: ComponentTypeId,
        /// The underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
}
