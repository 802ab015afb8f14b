//! Groups — a shared component table read through by member entities.
//!
//! A [`Group`] owns a member set and its own component table. Members see the
//! group's components through [`World::get`](crate::World::get) and
//! [`World::has`](crate::World::has) when they lack their own, but the
//! group's table never becomes part of any entity's storage or archetype.
//!
//! Membership is many-to-many and changes only through the world
//! ([`World::add_to_group`](crate::World::add_to_group) and friends), which
//! keeps its entity→groups index in step and notifies world observers.

use std::collections::{BTreeSet, HashMap};

use engine_component::{ComponentId, ComponentTypeId, ComponentValue, EntityId, GroupId};
use serde_json::Value;

use crate::codec;
use crate::error::WorldError;
use crate::event::Signal;

/// A set of member entities sharing one component table.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    members: BTreeSet<EntityId>,
    components: HashMap<ComponentTypeId, Value>,
    entity_added: Signal<EntityId>,
    entity_removed: Signal<EntityId>,
}

impl Group {
    pub(crate) fn new(id: GroupId) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
            components: HashMap::new(),
            entity_added: Signal::new(),
            entity_removed: Signal::new(),
        }
    }

    /// Returns this group's id.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    // -- Membership --

    /// Returns `true` if `entity` is a member.
    #[must_use]
    pub fn has_entity(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    /// Returns the members, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.members.iter().copied().collect()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fired with each entity that joins this group.
    #[must_use]
    pub fn on_entity_added(&self) -> &Signal<EntityId> {
        &self.entity_added
    }

    /// Fired with each entity that leaves this group.
    #[must_use]
    pub fn on_entity_removed(&self) -> &Signal<EntityId> {
        &self.entity_removed
    }

    pub(crate) fn insert_member(&mut self, entity: EntityId) -> bool {
        let added = self.members.insert(entity);
        if added {
            self.entity_added.fire(&entity);
        }
        added
    }

    pub(crate) fn remove_member(&mut self, entity: EntityId) -> bool {
        let removed = self.members.remove(&entity);
        if removed {
            self.entity_removed.fire(&entity);
        }
        removed
    }

    // -- Shared components --

    /// Set a shared component value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Encode`] if the value cannot be encoded.
    pub fn set<T: ComponentValue>(
        &mut self,
        component: ComponentId<T>,
        value: T,
    ) -> Result<(), WorldError> {
        let value = codec::encode(component.raw(), value)?;
        self.set_value(component.raw(), value);
        Ok(())
    }

    /// Set a shared component from an already-encoded value.
    pub fn set_value(&mut self, component: ComponentTypeId, value: Value) {
        self.components.insert(component, value);
    }

    /// Get a shared component value.
    #[must_use]
    pub fn get<T: ComponentValue>(&self, component: ComponentId<T>) -> Option<T> {
        self.get_value(component.raw())
            .and_then(|value| codec::decode(component.raw(), value))
    }

    /// Get a shared component in its encoded form.
    #[must_use]
    pub fn get_value(&self, component: ComponentTypeId) -> Option<&Value> {
        self.components.get(&component)
    }

    /// Returns `true` if the group's own table holds `component`.
    #[must_use]
    pub fn has(&self, component: impl Into<ComponentTypeId>) -> bool {
        self.components.contains_key(&component.into())
    }

    /// Remove a shared component. Returns `true` if it was present.
    pub fn remove(&mut self, component: impl Into<ComponentTypeId>) -> bool {
        self.components.remove(&component.into()).is_some()
    }

    /// Returns the ids of every shared component, ascending.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentTypeId> {
        let mut ids: Vec<ComponentTypeId> = self.components.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
