//! Archetype signatures and the archetype index.
//!
//! An archetype is a unique combination of component ids. Entities owning
//! exactly the same set of components share one bucket in the
//! [`ArchetypeIndex`], so a query only has to visit the buckets whose
//! signature satisfies it instead of every entity in the world.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::entity::EntityId;
use crate::query::QueryDescriptor;

/// The canonical key of an archetype: its component ids, sorted and
/// deduplicated.
///
/// The result is deterministic: the same set of ids always produces the same
/// signature regardless of the order they were attached in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(Vec<ComponentTypeId>);

impl Signature {
    /// Build the signature of a component set.
    #[must_use]
    pub fn from_components(ids: impl IntoIterator<Item = ComponentTypeId>) -> Self {
        let mut ids: Vec<ComponentTypeId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// The component ids of this archetype, ascending.
    #[must_use]
    pub fn components(&self) -> &[ComponentTypeId] {
        &self.0
    }

    /// Returns `true` if this archetype contains the given component.
    #[must_use]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Returns the number of components in this archetype.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the archetype of an entity with no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", id.0)?;
        }
        Ok(())
    }
}

/// Entities bucketed by signature.
///
/// Maintained incrementally: every change to an entity's own component set
/// re-assigns it, moving it out of its old bucket (dropping the bucket when it
/// empties) and into the new one (creating it when absent).
#[derive(Debug, Clone, Default)]
pub struct ArchetypeIndex {
    /// Member entities of each archetype.
    buckets: HashMap<Signature, BTreeSet<EntityId>>,
    /// Maps each entity to the archetype it belongs to.
    entity_signature: HashMap<EntityId, Signature>,
}

impl ArchetypeIndex {
    /// Create a new empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `entity` into the bucket for `signature`.
    ///
    /// Returns `true` if the entity changed buckets (or was not indexed yet).
    pub fn assign(&mut self, entity: EntityId, signature: Signature) -> bool {
        if self.entity_signature.get(&entity) == Some(&signature) {
            return false;
        }
        self.remove(entity);
        self.buckets
            .entry(signature.clone())
            .or_default()
            .insert(entity);
        self.entity_signature.insert(entity, signature);
        true
    }

    /// Drop `entity` from the index, returning the signature it had.
    pub fn remove(&mut self, entity: EntityId) -> Option<Signature> {
        let old = self.entity_signature.remove(&entity)?;
        if let Some(bucket) = self.buckets.get_mut(&old) {
            bucket.remove(&entity);
            if bucket.is_empty() {
                self.buckets.remove(&old);
            }
        }
        Some(old)
    }

    /// Returns the signature of the bucket currently holding `entity`.
    #[must_use]
    pub fn signature_of(&self, entity: EntityId) -> Option<&Signature> {
        self.entity_signature.get(&entity)
    }

    /// Returns the entities of one archetype.
    #[must_use]
    pub fn bucket(&self, signature: &Signature) -> Option<&BTreeSet<EntityId>> {
        self.buckets.get(signature)
    }

    /// Returns an iterator over all non-empty buckets.
    pub fn buckets(&self) -> impl Iterator<Item = (&Signature, &BTreeSet<EntityId>)> {
        self.buckets.iter()
    }

    /// Returns the number of archetypes with at least one entity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if no entity is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Union of every bucket whose signature satisfies `query`.
    #[must_use]
    pub fn matching(&self, query: &QueryDescriptor) -> BTreeSet<EntityId> {
        let mut entities = BTreeSet::new();
        if !query.is_satisfiable() {
            return entities;
        }
        for (signature, bucket) in &self.buckets {
            if query.matches(signature) {
                entities.extend(bucket.iter().copied());
            }
        }
        entities
    }
}
