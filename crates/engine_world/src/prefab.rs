//! Bundles and prefabs — reusable component lists for stamping entities.

use engine_component::{ComponentId, ComponentTypeId, ComponentValue, EntityId};
use serde_json::Value;

use crate::codec;
use crate::error::WorldError;
use crate::world::World;

/// An ordered list of (component, value) pairs.
///
/// Entries are applied in order, so a later entry for the same component
/// overwrites an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    entries: Vec<(ComponentTypeId, Value)>,
}

impl Bundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a typed component value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Encode`] if the value cannot be encoded.
    pub fn with<T: ComponentValue>(
        self,
        component: ComponentId<T>,
        value: T,
    ) -> Result<Self, WorldError> {
        let value = codec::encode(component.raw(), value)?;
        Ok(self.with_value(component.raw(), value))
    }

    /// Append an already-encoded component value.
    #[must_use]
    pub fn with_value(mut self, component: ComponentTypeId, value: Value) -> Self {
        self.entries.push((component, value));
        self
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bundle has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the entries, in application order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentTypeId, &Value)> {
        self.entries.iter().map(|(component, value)| (*component, value))
    }

    /// Set every entry on `entity`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if the entity is not live.
    pub fn apply(&self, world: &mut World, entity: EntityId) -> Result<(), WorldError> {
        for (component, value) in &self.entries {
            world.set_value(entity, *component, value.clone())?;
        }
        Ok(())
    }
}

/// A named bundle used as an entity template.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    name: String,
    bundle: Bundle,
}

impl Prefab {
    /// Create a prefab from a bundle.
    #[must_use]
    pub fn new(name: impl Into<String>, bundle: Bundle) -> Self {
        Self {
            name: name.into(),
            bundle,
        }
    }

    /// The prefab's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefab's component list.
    #[must_use]
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    /// Spawn an entity carrying the prefab's components.
    ///
    /// # Errors
    ///
    /// Propagates any error from applying the bundle.
    pub fn spawn(&self, world: &mut World) -> Result<EntityId, WorldError> {
        self.spawn_with(world, &Bundle::new())
    }

    /// Spawn an entity carrying the prefab's components, then `overrides`.
    ///
    /// # Errors
    ///
    /// Propagates any error from applying the bundles.
    pub fn spawn_with(
        &self,
        world: &mut World,
        overrides: &Bundle,
    ) -> Result<EntityId, WorldError> {
        let entity = world.spawn();
        self.bundle.apply(world, entity)?;
        overrides.apply(world, entity)?;
        Ok(entity)
    }

    /// A new prefab whose list is this one's followed by `more`.
    #[must_use]
    pub fn extend(&self, more: &Bundle) -> Prefab {
        let mut bundle = self.bundle.clone();
        bundle.entries.extend(more.entries.iter().cloned());
        Prefab {
            name: self.name.clone(),
            bundle,
        }
    }
}
