//! Component identifiers.
//!
//! Storage is untyped: the world keeps component values in an erased
//! container keyed by [`ComponentTypeId`]. Type safety is recovered at the
//! call site through [`ComponentId<T>`], which carries the value type as a
//! phantom parameter.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::id::define_id;

define_id!(
    /// The untyped identity of a registered component slot.
    ComponentTypeId,
    "Component"
);

/// Values that may be stored in a component slot.
///
/// Component values are plain data: anything that serialises into the
/// world's erased container and back.
pub trait ComponentValue: Serialize + DeserializeOwned + 'static {}

impl<T: Serialize + DeserializeOwned + 'static> ComponentValue for T {}

/// A component handle that knows the type of the values stored under it.
///
/// Obtained from [`ComponentRegistry::register`](crate::ComponentRegistry::register).
/// The handle is `Copy` regardless of `T`.
pub struct ComponentId<T> {
    raw: ComponentTypeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentId<T> {
    /// Attach a value type to a raw component id.
    ///
    /// The caller vouches that values stored under `raw` decode as `T`.
    #[must_use]
    pub const fn from_raw(raw: ComponentTypeId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped component id.
    #[must_use]
    pub const fn raw(self) -> ComponentTypeId {
        self.raw
    }
}

impl<T> Clone for ComponentId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentId<T> {}

impl<T> PartialEq for ComponentId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for ComponentId<T> {}

impl<T> Hash for ComponentId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for ComponentId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentId")
            .field(&self.raw.0)
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T> From<ComponentId<T>> for ComponentTypeId {
    fn from(id: ComponentId<T>) -> Self {
        id.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NotCopy;

    #[test]
    fn test_typed_id_is_copy_for_any_type() {
        let id = ComponentId::<NotCopy>::from_raw(ComponentTypeId(3));
        let copy = id;
        assert_eq!(id, copy);
        assert_eq!(copy.raw(), ComponentTypeId(3));
    }

    #[test]
    fn test_typed_id_converts_to_raw() {
        let id = ComponentId::<f32>::from_raw(ComponentTypeId(9));
        let raw: ComponentTypeId = id.into();
        assert_eq!(raw.id(), 9);
    }

    #[test]
    fn test_component_type_id_display() {
        assert_eq!(ComponentTypeId(5).to_string(), "Component(5)");
    }
}
