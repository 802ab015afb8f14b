//! Query descriptors — the component predicate behind every world query.
//!
//! A [`QueryDescriptor`] names the components an entity must own and the
//! components it must not own. It is matched against archetype signatures,
//! i.e. against an entity's own components only.

use serde::{Deserialize, Serialize};

use crate::archetype::Signature;
use crate::component::ComponentTypeId;

/// A required/excluded component predicate.
///
/// The order of `required` is significant: it is the order in which a query
/// hands component values back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Components the entity must own.
    pub required: Vec<ComponentTypeId>,
    /// Components the entity must not own.
    pub excluded: Vec<ComponentTypeId>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor, matching every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a descriptor requiring each of `required`, in order.
    #[must_use]
    pub fn from_required(required: impl IntoIterator<Item = ComponentTypeId>) -> Self {
        Self {
            required: required.into_iter().collect(),
            excluded: Vec::new(),
        }
    }

    /// Add a required component.
    #[must_use]
    pub fn with(mut self, id: impl Into<ComponentTypeId>) -> Self {
        self.required.push(id.into());
        self
    }

    /// Add an excluded component.
    #[must_use]
    pub fn without(mut self, id: impl Into<ComponentTypeId>) -> Self {
        self.excluded.push(id.into());
        self
    }

    /// Returns `false` when some component is both required and excluded.
    ///
    /// Such a query is valid; it simply never matches anything.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        !self.required.iter().any(|c| self.excluded.contains(c))
    }

    /// Checks whether an archetype with this signature satisfies the query.
    ///
    /// ```text
    /// required ⊆ signature  AND  excluded ∩ signature = ∅
    /// ```
    #[must_use]
    pub fn matches(&self, signature: &Signature) -> bool {
        self.required.iter().all(|c| signature.contains(*c))
            && !self.excluded.iter().any(|c| signature.contains(*c))
    }
}
