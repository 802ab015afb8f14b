//! Entity identifiers.
//!
//! An [`EntityId`] is a lightweight `u64` handle with no inherent data. All
//! entity state lives out-of-line in the world's component tables.

use crate::id::define_id;

define_id!(
    /// A unique entity identifier.
    ///
    /// Entities are pure identifiers and carry no data of their own.
    /// Components are attached to entities to give them meaning. An id is
    /// unique for the lifetime of the world that allocated it and is never
    /// reused, even after the entity is despawned.
    EntityId,
    "Entity"
);
