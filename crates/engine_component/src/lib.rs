//! # engine_component
//!
//! The identity half of the entity world: what an entity, a component slot,
//! a group and a snapshot are called, and how entities are bucketed by the
//! set of components they own.
//!
//! This crate provides:
//!
//! - [`IdAllocator`]: monotonically increasing, never-reused identifiers.
//! - [`EntityId`], [`GroupId`], [`SnapshotId`], [`ComponentTypeId`]: opaque `u64` handles.
//! - [`ComponentId`]: a component handle carrying its value type.
//! - [`ComponentRegistry`]: name to component id binding.
//! - [`ArchetypeIndex`]: entities bucketed by their exact component set.
//! - [`QueryDescriptor`]: a required/excluded component predicate.

pub mod archetype;
pub mod component;
pub mod entity;
pub mod id;
pub mod query;
pub mod registry;

pub use archetype::{ArchetypeIndex, Signature};
pub use component::{ComponentId, ComponentTypeId, ComponentValue};
pub use entity::EntityId;
pub use id::{GroupId, IdAllocator, RawId, SnapshotId};
pub use query::QueryDescriptor;
pub use registry::{ComponentRegistry, RegistryError};
