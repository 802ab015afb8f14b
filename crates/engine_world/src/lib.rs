//! # engine_world
//!
//! The world store: a set of loosely-typed entities, each an arbitrary bag of
//! component values, queried by component presence.
//!
//! This crate provides:
//!
//! - [`World`]: entity lifecycle and per-entity component tables, kept
//!   bucketed by archetype.
//! - [`Query`]: required/excluded component queries resolved against the
//!   archetype index.
//! - [`Group`]: a shared component table read as a fallback by its members.
//! - [`Snapshot`]: deep, isolated captures of world state and their revert.
//! - [`Signal`]: the synchronous event channel behind [`WorldEvents`].
//! - [`Bundle`] / [`Prefab`]: reusable component lists for stamping entities.
//!
//! The world is single-threaded and synchronous. Every operation runs to
//! completion before returning, and event handlers run in-line on the
//! caller's stack.
//!
//! ## Usage
//!
//! ```rust
//! use engine_world::World;
//!
//! let mut world = World::new();
//! let health = world.register_component::<u32>("Health").unwrap();
//!
//! let e = world.spawn();
//! world.set(e, health, 100).unwrap();
//!
//! let rows = world.query([health.raw()]).collect();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].get(health), Some(100));
//! ```

mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod group;
pub mod prefab;
pub mod query;
pub mod snapshot;
pub mod world;

pub use config::WorldConfig;
pub use error::WorldError;
pub use event::{Connection, Signal, WorldEvent, WorldEvents};
pub use group::Group;
pub use prefab::{Bundle, Prefab};
pub use query::{Query, QueryRow};
pub use snapshot::Snapshot;
pub use world::World;

pub use engine_component::{
    ComponentId, ComponentTypeId, ComponentValue, EntityId, GroupId, QueryDescriptor, Signature,
    SnapshotId,
};
