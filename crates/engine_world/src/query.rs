//! Query engine — resolves a [`QueryDescriptor`] against a [`World`].
//!
//! A query with required components walks the archetype index and unions
//! every bucket whose signature holds all of them and none of the excluded
//! ones. A query with no required components scans every live entity.
//! Either way, matching looks only at an entity's own components. Group
//! overlays are never consulted, neither for `with` nor for `without`.
//!
//! Matches are visited in ascending entity id order.

use std::collections::BTreeSet;

use engine_component::{ComponentId, ComponentTypeId, ComponentValue, EntityId, QueryDescriptor};
use serde_json::Value;

use crate::codec;
use crate::world::World;

/// A required/excluded component query over a borrowed world.
///
/// The world cannot be mutated while a query borrows it, so `each` callbacks
/// always observe a settled world.
#[derive(Debug, Clone)]
pub struct Query<'w> {
    world: &'w World,
    descriptor: QueryDescriptor,
}

impl<'w> Query<'w> {
    pub(crate) fn new(world: &'w World, descriptor: QueryDescriptor) -> Self {
        Self { world, descriptor }
    }

    /// Require another component.
    #[must_use]
    pub fn with(mut self, component: impl Into<ComponentTypeId>) -> Self {
        self.descriptor = self.descriptor.with(component);
        self
    }

    /// Exclude entities owning this component.
    #[must_use]
    pub fn without(mut self, component: impl Into<ComponentTypeId>) -> Self {
        self.descriptor = self.descriptor.without(component);
        self
    }

    /// The predicate this query resolves.
    #[must_use]
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    fn matching(&self) -> BTreeSet<EntityId> {
        if !self.descriptor.required.is_empty() {
            return self.world.archetype_index().matching(&self.descriptor);
        }
        let excluded = &self.descriptor.excluded;
        self.world
            .tables()
            .filter(|(_, table)| !excluded.iter().any(|c| table.contains_key(c)))
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Invoke `f` once per match with the entity and its required component
    /// values, in required order, read from the entity's own table.
    pub fn each(&self, mut f: impl FnMut(EntityId, &[&'w Value])) {
        let required = &self.descriptor.required;
        let mut values: Vec<&'w Value> = Vec::with_capacity(required.len());
        'entities: for entity in self.matching() {
            let table = self.world.own_table(entity);
            debug_assert!(
                table.is_some_and(|table| required.iter().all(|c| table.contains_key(c))),
                "{entity} matched without owning every required component"
            );
            let Some(table) = table else {
                continue;
            };
            values.clear();
            for component in required {
                let Some(value) = table.get(component) else {
                    continue 'entities;
                };
                values.push(value);
            }
            f(entity, &values);
        }
    }

    /// Materialise every match into a row.
    #[must_use]
    pub fn collect(&self) -> Vec<QueryRow> {
        let mut rows = Vec::new();
        self.each(|entity, values| {
            rows.push(QueryRow {
                entity,
                components: self.descriptor.required.clone(),
                values: values.iter().map(|&value| value.clone()).collect(),
            });
        });
        rows
    }

    /// Transform each collected row.
    pub fn map<R>(&self, f: impl FnMut(&QueryRow) -> R) -> Vec<R> {
        self.collect().iter().map(f).collect()
    }

    /// Keep the collected rows satisfying `f`.
    pub fn filter(&self, mut f: impl FnMut(&QueryRow) -> bool) -> Vec<QueryRow> {
        self.collect().into_iter().filter(|row| f(row)).collect()
    }

    /// Returns the matching entities, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.matching().into_iter().collect()
    }

    /// Returns the number of matches.
    #[must_use]
    pub fn count(&self) -> usize {
        self.matching().len()
    }

    /// Returns `true` if nothing matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// One matched entity and copies of its required component values.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    entity: EntityId,
    components: Vec<ComponentTypeId>,
    values: Vec<Value>,
}

impl QueryRow {
    /// The matched entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The required component values, in required order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value at position `index` of the required list.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decode the value of a required component.
    #[must_use]
    pub fn get<T: ComponentValue>(&self, component: ComponentId<T>) -> Option<T> {
        let index = self.components.iter().position(|&c| c == component.raw())?;
        codec::decode(component.raw(), &self.values[index])
    }
}
