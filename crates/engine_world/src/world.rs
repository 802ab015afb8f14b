//! Runtime entity-component storage with dynamic typing.
//!
//! Components are registered by name, not by Rust type, so values are stored
//! as `serde_json::Value` keyed by [`ComponentTypeId`]. Typed access goes
//! through [`ComponentId<T>`], which encodes on the way in and decodes on the
//! way out.
//!
//! Every change to an entity's own component set re-buckets it in the
//! [`ArchetypeIndex`]. Group-provided components are a read-time overlay and
//! never take part in an entity's archetype.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use engine_component::{
    ArchetypeIndex, ComponentId, ComponentRegistry, ComponentTypeId, ComponentValue, EntityId,
    GroupId, IdAllocator, QueryDescriptor, Signature, SnapshotId,
};
use serde_json::Value;
use tracing::{debug, trace};

use crate::codec;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::event::{WorldEvent, WorldEvents};
use crate::group::Group;
use crate::query::Query;

/// A single entity's own components.
pub(crate) type ComponentTable = HashMap<ComponentTypeId, Value>;

/// The entity world: entity storage, archetype index, groups, and observers.
///
/// Event handlers run synchronously inside the operation that triggered them.
/// They receive event payloads only; the world is still mid-operation and
/// cannot be borrowed from a handler.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    registry: ComponentRegistry,
    entity_ids: IdAllocator<EntityId>,
    group_ids: IdAllocator<GroupId>,
    pub(crate) snapshot_ids: IdAllocator<SnapshotId>,
    /// Live entities and their own component tables.
    entities: HashMap<EntityId, ComponentTable>,
    archetypes: ArchetypeIndex,
    groups: BTreeMap<GroupId, Group>,
    /// Reverse index: the groups each entity belongs to.
    entity_groups: HashMap<EntityId, BTreeSet<GroupId>>,
    events: WorldEvents,
}

impl World {
    /// Create a new empty world with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a new empty world.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            registry: ComponentRegistry::new(),
            entity_ids: IdAllocator::new(),
            group_ids: IdAllocator::new(),
            snapshot_ids: IdAllocator::new(),
            entities: HashMap::new(),
            archetypes: ArchetypeIndex::new(),
            groups: BTreeMap::new(),
            entity_groups: HashMap::new(),
            events: WorldEvents::default(),
        }
    }

    /// Access the config.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world's observer signals.
    #[must_use]
    pub fn events(&self) -> &WorldEvents {
        &self.events
    }

    pub(crate) fn emit(&self, event: WorldEvent) {
        if self.config.trace_events {
            trace!(world = %self.config.name, ?event, "world event");
        }
        self.events.emit(event);
    }

    // -- Components --

    /// Register a component slot under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Registry`] if the name is already taken.
    pub fn register_component<T: ComponentValue>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<ComponentId<T>, WorldError> {
        Ok(self.registry.register(name)?)
    }

    /// The component registry of this world.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- Entity lifecycle --

    /// Spawn a new entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        let entity = self.entity_ids.allocate();
        self.insert_entity(entity);
        debug!(world = %self.config.name, entity = %entity, "spawned entity");
        entity
    }

    /// Bring a previously allocated id back to life with an empty table.
    pub(crate) fn respawn(&mut self, entity: EntityId) {
        self.insert_entity(entity);
        debug!(world = %self.config.name, entity = %entity, "respawned entity");
    }

    fn insert_entity(&mut self, entity: EntityId) {
        self.entities.insert(entity, ComponentTable::new());
        self.archetypes.assign(entity, Signature::default());
        self.emit(WorldEvent::EntitySpawned(entity));
    }

    /// Despawn an entity.
    ///
    /// Detaches it from every group, reports each of its components as
    /// removed, then deletes it. Returns `false` if the entity was not live.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let Some(table) = self.entities.get(&entity) else {
            return false;
        };
        let mut components: Vec<ComponentTypeId> = table.keys().copied().collect();
        components.sort_unstable();

        for group_id in self.entity_groups.remove(&entity).unwrap_or_default() {
            if let Some(group) = self.groups.get_mut(&group_id) {
                group.remove_member(entity);
            }
            self.emit(WorldEvent::EntityRemovedFromGroup(entity, group_id));
        }
        for component in components {
            self.emit(WorldEvent::ComponentRemoved(entity, component));
        }

        self.entities.remove(&entity);
        self.archetypes.remove(entity);
        debug!(world = %self.config.name, entity = %entity, "despawned entity");
        self.emit(WorldEvent::EntityDespawned(entity));
        true
    }

    /// Despawn every entity.
    pub fn clear(&mut self) {
        for entity in self.entities() {
            self.despawn(entity);
        }
    }

    /// Check if an entity is live.
    #[must_use]
    pub fn valid(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Return all live entity IDs, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Return the count of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Component operations --

    /// Set a component on an entity.
    ///
    /// Reports [`WorldEvent::ComponentAdded`] only when the component was not
    /// already attached; overwriting is silent.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if the entity is not live, or
    /// [`WorldError::Encode`] if the value cannot be encoded.
    pub fn set<T: ComponentValue>(
        &mut self,
        entity: EntityId,
        component: ComponentId<T>,
        value: T,
    ) -> Result<(), WorldError> {
        if !self.valid(entity) {
            return Err(WorldError::UnknownEntity(entity));
        }
        let value = codec::encode(component.raw(), value)?;
        self.set_value(entity, component.raw(), value)
    }

    /// Set a component on an entity from an already-encoded value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if the entity is not live.
    pub fn set_value(
        &mut self,
        entity: EntityId,
        component: ComponentTypeId,
        value: Value,
    ) -> Result<(), WorldError> {
        let table = self
            .entities
            .get_mut(&entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        if table.insert(component, value).is_none() {
            self.reindex(entity);
            self.emit(WorldEvent::ComponentAdded(entity, component));
        }
        Ok(())
    }

    /// Write a component and report it as added whether or not it was
    /// already present. Used by revert.
    pub(crate) fn restore_value(
        &mut self,
        entity: EntityId,
        component: ComponentTypeId,
        value: Value,
    ) {
        let Some(table) = self.entities.get_mut(&entity) else {
            return;
        };
        let added = table.insert(component, value).is_none();
        if added {
            self.reindex(entity);
        }
        self.emit(WorldEvent::ComponentAdded(entity, component));
    }

    /// Get a component value, falling back to the entity's groups.
    ///
    /// The entity's own value wins. Otherwise the first group (in ascending
    /// group id order) holding the component supplies it.
    #[must_use]
    pub fn get<T: ComponentValue>(&self, entity: EntityId, component: ComponentId<T>) -> Option<T> {
        self.get_value(entity, component.raw())
            .and_then(|value| codec::decode(component.raw(), value))
    }

    /// Get a component in its encoded form, with the same resolution as
    /// [`World::get`].
    #[must_use]
    pub fn get_value(&self, entity: EntityId, component: ComponentTypeId) -> Option<&Value> {
        let table = self.entities.get(&entity)?;
        if let Some(value) = table.get(&component) {
            return Some(value);
        }
        self.entity_groups
            .get(&entity)?
            .iter()
            .find_map(|id| self.groups.get(id)?.get_value(component))
    }

    /// Check if an entity has a component, either its own or via a group.
    #[must_use]
    pub fn has(&self, entity: EntityId, component: impl Into<ComponentTypeId>) -> bool {
        self.get_value(entity, component.into()).is_some()
    }

    /// Remove a component from an entity's own table.
    ///
    /// Group tables are never touched. Returns `false` if the entity is not
    /// live or does not itself own the component.
    pub fn remove(&mut self, entity: EntityId, component: impl Into<ComponentTypeId>) -> bool {
        let component = component.into();
        let Some(table) = self.entities.get_mut(&entity) else {
            return false;
        };
        if table.remove(&component).is_none() {
            return false;
        }
        self.reindex(entity);
        self.emit(WorldEvent::ComponentRemoved(entity, component));
        true
    }

    /// Get the ids of an entity's own components, ascending.
    #[must_use]
    pub fn components_of(&self, entity: EntityId) -> Option<Vec<ComponentTypeId>> {
        let table = self.entities.get(&entity)?;
        let mut ids: Vec<ComponentTypeId> = table.keys().copied().collect();
        ids.sort_unstable();
        Some(ids)
    }

    pub(crate) fn own_table(&self, entity: EntityId) -> Option<&ComponentTable> {
        self.entities.get(&entity)
    }

    pub(crate) fn tables(&self) -> impl Iterator<Item = (EntityId, &ComponentTable)> {
        self.entities.iter().map(|(&entity, table)| (entity, table))
    }

    // -- Archetypes --

    fn reindex(&mut self, entity: EntityId) {
        if let Some(table) = self.entities.get(&entity) {
            let signature = Signature::from_components(table.keys().copied());
            self.archetypes.assign(entity, signature);
        }
    }

    /// Returns the signature of the archetype bucket holding `entity`.
    #[must_use]
    pub fn signature_of(&self, entity: EntityId) -> Option<&Signature> {
        self.archetypes.signature_of(entity)
    }

    /// Returns the number of non-empty archetype buckets.
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// The archetype index.
    #[must_use]
    pub fn archetype_index(&self) -> &ArchetypeIndex {
        &self.archetypes
    }

    // -- Query --

    /// Start a query requiring each of `required`.
    ///
    /// Values are handed back in `required` order.
    #[must_use]
    pub fn query(&self, required: impl IntoIterator<Item = ComponentTypeId>) -> Query<'_> {
        Query::new(self, QueryDescriptor::from_required(required))
    }

    /// Start a query with no required components, matching every live entity.
    #[must_use]
    pub fn query_all(&self) -> Query<'_> {
        Query::new(self, QueryDescriptor::new())
    }

    // -- Groups --

    /// Create a new empty group.
    pub fn create_group(&mut self) -> GroupId {
        let id = self.group_ids.allocate();
        self.groups.insert(id, Group::new(id));
        debug!(world = %self.config.name, group = %id, "created group");
        id
    }

    /// Empty a group's membership, then discard it. Members stay live.
    ///
    /// Returns `false` if the group does not exist.
    pub fn remove_group(&mut self, group: GroupId) -> bool {
        let Some(members) = self.groups.get(&group).map(Group::entities) else {
            return false;
        };
        for entity in members {
            self.remove_from_group(group, entity);
        }
        self.groups.remove(&group);
        debug!(world = %self.config.name, group = %group, "removed group");
        true
    }

    /// Access a group.
    #[must_use]
    pub fn group(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(&group)
    }

    /// Access a group mutably, for its shared component table.
    #[must_use]
    pub fn group_mut(&mut self, group: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&group)
    }

    /// Return all group IDs, ascending.
    #[must_use]
    pub fn groups(&self) -> Vec<GroupId> {
        self.groups.keys().copied().collect()
    }

    /// Add a live entity to a group.
    ///
    /// Returns `Ok(false)` without any event if the entity is already a member
    /// or is not live.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownGroup`] if the group does not exist.
    pub fn add_to_group(&mut self, group: GroupId, entity: EntityId) -> Result<bool, WorldError> {
        let target = self
            .groups
            .get_mut(&group)
            .ok_or(WorldError::UnknownGroup(group))?;
        if !self.entities.contains_key(&entity) || !target.insert_member(entity) {
            return Ok(false);
        }
        self.entity_groups.entry(entity).or_default().insert(group);
        debug!(world = %self.config.name, entity = %entity, group = %group, "entity joined group");
        self.emit(WorldEvent::EntityAddedToGroup(entity, group));
        Ok(true)
    }

    /// Remove an entity from a group.
    ///
    /// Returns `false` if the group does not exist or the entity is not a
    /// member.
    pub fn remove_from_group(&mut self, group: GroupId, entity: EntityId) -> bool {
        let Some(target) = self.groups.get_mut(&group) else {
            return false;
        };
        if !target.remove_member(entity) {
            return false;
        }
        if let Some(memberships) = self.entity_groups.get_mut(&entity) {
            memberships.remove(&group);
            if memberships.is_empty() {
                self.entity_groups.remove(&entity);
            }
        }
        debug!(world = %self.config.name, entity = %entity, group = %group, "entity left group");
        self.emit(WorldEvent::EntityRemovedFromGroup(entity, group));
        true
    }

    /// Return the groups an entity belongs to, ascending.
    #[must_use]
    pub fn groups_for_entity(&self, entity: EntityId) -> Vec<GroupId> {
        self.entity_groups
            .get(&entity)
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Return the groups whose shared table holds `component`, ascending.
    #[must_use]
    pub fn groups_with_component(&self, component: impl Into<ComponentTypeId>) -> Vec<GroupId> {
        let component = component.into();
        self.groups
            .values()
            .filter(|group| group.has(component))
            .map(Group::id)
            .collect()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
