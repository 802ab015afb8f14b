//! Component registry — binds human-readable names to component ids.
//!
//! Each world owns its own registry, so two worlds in the same process never
//! share or collide on component ids.

use std::collections::HashMap;

use crate::component::{ComponentId, ComponentTypeId, ComponentValue};
use crate::id::IdAllocator;

/// Errors raised by the [`ComponentRegistry`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A component with this name was already registered.
    #[error("component name '{0}' is already registered")]
    DuplicateName(String),
}

/// Registry of all component slots known to a world.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    allocator: IdAllocator<ComponentTypeId>,
    by_name: HashMap<String, ComponentTypeId>,
    names: HashMap<ComponentTypeId, String>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component slot under `name`, typed as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if `name` is already bound.
    /// The registry is left unchanged and no id is consumed.
    pub fn register<T: ComponentValue>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<ComponentId<T>, RegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        let id = self.allocator.allocate();
        self.by_name.insert(name.clone(), id);
        self.names.insert(id, name);
        Ok(ComponentId::from_raw(id))
    }

    /// Returns the id bound to `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name a component id was registered under.
    #[must_use]
    pub fn name_of(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_new_component() {
        let mut registry = ComponentRegistry::new();
        let health = registry.register::<u32>("Health").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Health"), Some(health.raw()));
        assert_eq!(registry.name_of(health.raw()), Some("Health"));
    }

    #[test]
    fn test_register_different_components() {
        let mut registry = ComponentRegistry::new();
        let health = registry.register::<u32>("Health").unwrap();
        let team = registry.register::<String>("Team").unwrap();
        assert_ne!(health.raw(), team.raw());
        assert!(health.raw() < team.raw());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ComponentRegistry::new();
        let first = registry.register::<u32>("Health").unwrap();
        let err = registry.register::<f64>("Health").unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("Health".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Health"), Some(first.raw()));
    }

    #[test]
    fn test_duplicate_does_not_consume_an_id() {
        let mut registry = ComponentRegistry::new();
        let _ = registry.register::<u32>("Health").unwrap();
        let _ = registry.register::<u32>("Health");
        let next = registry.register::<u32>("Armor").unwrap();
        assert_eq!(next.raw().id(), 2);
    }

    #[test]
    fn test_separate_registries_are_independent() {
        let mut a = ComponentRegistry::new();
        let mut b = ComponentRegistry::new();
        let _ = a.register::<u32>("Health").unwrap();
        assert!(b.register::<u32>("Health").is_ok());
        assert!(b.lookup("Team").is_none());
    }
}
