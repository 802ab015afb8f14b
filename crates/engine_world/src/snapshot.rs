//! Snapshots — deep, isolated captures of entity state and their revert.
//!
//! A snapshot copies each captured entity's own component table. Values are
//! `serde_json::Value` trees, so a copy shares nothing with the live world or
//! with any other copy.
//!
//! A **full** snapshot (no filter) restores the world exactly: entities it
//! did not capture are despawned and components it did not capture are
//! removed. A **partial** snapshot (non-empty filter) only ever adds or
//! overwrites the filtered components.
//!
//! A full snapshot also records which groups each captured entity belonged
//! to, and its revert rejoins or leaves groups to match. Group tables are not
//! captured, and a group removed since the capture is not recreated.

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use engine_component::{
    ComponentId, ComponentTypeId, ComponentValue, EntityId, GroupId, SnapshotId,
};
use serde_json::Value;
use tracing::info;

use crate::codec;
use crate::world::{ComponentTable, World};

/// An immutable capture of world state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    captured_at: SystemTime,
    entities: BTreeMap<EntityId, ComponentTable>,
    memberships: BTreeMap<EntityId, BTreeSet<GroupId>>,
    filter: Option<Vec<ComponentTypeId>>,
}

impl Snapshot {
    /// Returns this snapshot's id.
    #[must_use]
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    /// When the snapshot was taken.
    #[must_use]
    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// The components this snapshot was restricted to, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&[ComponentTypeId]> {
        self.filter.as_deref()
    }

    /// Returns `true` if every component of every entity was captured.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.filter.is_none()
    }

    /// Returns `true` if the capture was restricted to a component filter.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.filter.is_some()
    }

    /// Returns `true` if `entity` was captured.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Returns the number of captured entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the captured entities, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// The groups `entity` belonged to at capture time, ascending. Always
    /// empty for a partial snapshot.
    #[must_use]
    pub fn groups_of(&self, entity: EntityId) -> Vec<GroupId> {
        self.memberships
            .get(&entity)
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Decode a captured component value.
    #[must_use]
    pub fn get<T: ComponentValue>(&self, entity: EntityId, component: ComponentId<T>) -> Option<T> {
        self.value(entity, component.raw())
            .and_then(|value| codec::decode(component.raw(), value))
    }

    /// A captured component value in its encoded form.
    #[must_use]
    pub fn value(&self, entity: EntityId, component: ComponentTypeId) -> Option<&Value> {
        self.entities.get(&entity)?.get(&component)
    }
}

impl World {
    /// Capture the current state.
    ///
    /// With `None` or an empty filter, every live entity's full table is
    /// captured. With a non-empty filter only the listed components are, and
    /// entities owning none of them are left out.
    ///
    /// Returns `None` if the world has no live entities.
    pub fn snapshot(&mut self, filter: Option<&[ComponentTypeId]>) -> Option<Snapshot> {
        if self.entity_count() == 0 {
            return None;
        }
        let filter = filter.filter(|f| !f.is_empty()).map(<[_]>::to_vec);

        let mut entities = BTreeMap::new();
        for (entity, table) in self.tables() {
            let captured: ComponentTable = match &filter {
                None => table.clone(),
                Some(keep) => table
                    .iter()
                    .filter(|(component, _)| keep.contains(*component))
                    .map(|(&component, value)| (component, value.clone()))
                    .collect(),
            };
            if filter.is_some() && captured.is_empty() {
                continue;
            }
            entities.insert(entity, captured);
        }

        let mut memberships = BTreeMap::new();
        if filter.is_none() {
            for &entity in entities.keys() {
                let groups: BTreeSet<GroupId> =
                    self.groups_for_entity(entity).into_iter().collect();
                if !groups.is_empty() {
                    memberships.insert(entity, groups);
                }
            }
        }

        let id = self.snapshot_ids.allocate();
        info!(
            world = %self.config().name,
            snapshot = %id,
            entities = entities.len(),
            partial = filter.is_some(),
            "captured snapshot"
        );
        Some(Snapshot {
            id,
            captured_at: SystemTime::now(),
            entities,
            memberships,
            filter,
        })
    }

    /// Replay a snapshot into the world.
    ///
    /// Captured entities that are no longer live are respawned under their
    /// original id, unless they were captured with no components. Every
    /// restored component is reported as added, even when its value did not
    /// change.
    ///
    /// A full snapshot additionally despawns live entities it did not capture
    /// and removes components it did not capture. It then puts each restored
    /// entity back into the captured groups that still exist, and takes it out
    /// of groups it joined since. A partial snapshot never removes anything
    /// and leaves membership alone.
    pub fn revert(&mut self, snapshot: &Snapshot) {
        let full = snapshot.is_full();
        let mut despawned = 0usize;
        let mut respawned = 0usize;
        let mut rejoined = 0usize;

        if full {
            for entity in self.entities() {
                if !snapshot.contains(entity) && self.despawn(entity) {
                    despawned += 1;
                }
            }
        }

        for (&entity, captured) in &snapshot.entities {
            if !self.valid(entity) {
                if captured.is_empty() {
                    continue;
                }
                self.respawn(entity);
                respawned += 1;
            }

            if full {
                let stale: Vec<ComponentTypeId> = self
                    .components_of(entity)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|component| !captured.contains_key(component))
                    .collect();
                for component in stale {
                    self.remove(entity, component);
                }
            }

            let mut components: Vec<ComponentTypeId> = captured.keys().copied().collect();
            components.sort_unstable();
            for component in components {
                if let Some(value) = captured.get(&component) {
                    self.restore_value(entity, component, value.clone());
                }
            }

            if full {
                rejoined += self.restore_memberships(entity, snapshot.memberships.get(&entity));
            }
        }

        info!(
            world = %self.config().name,
            snapshot = %snapshot.id,
            partial = !full,
            despawned,
            respawned,
            rejoined,
            "reverted snapshot"
        );
    }

    /// Make `entity`'s membership match `captured`, skipping groups that no
    /// longer exist. Returns the number of groups rejoined.
    fn restore_memberships(
        &mut self,
        entity: EntityId,
        captured: Option<&BTreeSet<GroupId>>,
    ) -> usize {
        let empty = BTreeSet::new();
        let captured = captured.unwrap_or(&empty);
        for group in self.groups_for_entity(entity) {
            if !captured.contains(&group) {
                self.remove_from_group(group, entity);
            }
        }
        let mut rejoined = 0;
        for &group in captured {
            if self.group(group).is_some() && matches!(self.add_to_group(group, entity), Ok(true)) {
                rejoined += 1;
            }
        }
        rejoined
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::event::WorldEvent;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inventory {
        items: Vec<String>,
    }

    struct Fixture {
        world: World,
        health: ComponentId<u32>,
        name: ComponentId<String>,
        inventory: ComponentId<Inventory>,
    }

    fn fixture() -> Fixture {
        let mut world = World::new();
        let health = world.register_component("Health").unwrap();
        let name = world.register_component("Name").unwrap();
        let inventory = world.register_component("Inventory").unwrap();
        Fixture {
            world,
            health,
            name,
            inventory,
        }
    }

    /// Every (entity, component) the world can observe, for state comparison.
    fn observe(world: &World, ids: &[ComponentTypeId]) -> Vec<(EntityId, ComponentTypeId, Value)> {
        let mut state = Vec::new();
        for entity in world.entities() {
            for &component in ids {
                if let Some(value) = world.get_value(entity, component) {
                    state.push((entity, component, value.clone()));
                }
            }
        }
        state
    }

    #[test]
    fn test_snapshot_of_empty_world_is_none() {
        let mut world = World::new();
        assert!(world.snapshot(None).is_none());
        let e = world.spawn();
        world.despawn(e);
        assert!(world.snapshot(None).is_none());
    }

    #[test]
    fn test_snapshot_ids_increase() {
        let mut world = World::new();
        world.spawn();
        let s1 = world.snapshot(None).unwrap();
        let s2 = world.snapshot(None).unwrap();
        assert!(s2.id() > s1.id());
        assert!(s2.captured_at() >= s1.captured_at());
    }

    #[test]
    fn test_snapshot_is_isolated_from_live_state() {
        let Fixture {
            mut world,
            inventory,
            ..
        } = fixture();
        let e = world.spawn();
        world
            .set(e, inventory, Inventory { items: vec!["sword".into()] })
            .unwrap();
        let snapshot = world.snapshot(None).unwrap();

        world
            .set(e, inventory, Inventory { items: vec!["sword".into(), "shield".into()] })
            .unwrap();
        assert_eq!(
            snapshot.get(e, inventory),
            Some(Inventory { items: vec!["sword".into()] })
        );

        world.revert(&snapshot);
        world
            .set(e, inventory, Inventory { items: vec![] })
            .unwrap();
        assert_eq!(
            snapshot.get(e, inventory),
            Some(Inventory { items: vec!["sword".into()] })
        );
    }

    #[test]
    fn test_full_round_trip_restores_state() {
        let Fixture {
            mut world,
            health,
            name,
            inventory,
        } = fixture();
        let ids = [health.raw(), name.raw(), inventory.raw()];
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.set(a, health, 10).unwrap();
        world.set(a, name, "alpha".into()).unwrap();
        world.set(b, health, 20).unwrap();
        world.set(c, inventory, Inventory { items: vec!["gem".into()] }).unwrap();

        let before = observe(&world, &ids);
        let live_before = world.entities();
        let s0 = world.snapshot(None).unwrap();
        assert!(s0.is_full());

        // Arbitrary mutation.
        world.despawn(b);
        world.set(a, health, 99).unwrap();
        world.remove(a, name);
        world.set(c, health, 5).unwrap();
        let d = world.spawn();
        world.set(d, name, "delta".into()).unwrap();

        world.revert(&s0);
        assert_eq!(world.entities(), live_before);
        assert!(!world.valid(d));
        assert_eq!(observe(&world, &ids), before);
        for e in &live_before {
            assert_eq!(
                world.signature_of(*e).unwrap().components(),
                world.components_of(*e).unwrap().as_slice()
            );
        }

        world.revert(&s0);
        assert_eq!(world.entities(), live_before);
        assert_eq!(observe(&world, &ids), before);
    }

    #[test]
    fn test_full_revert_does_not_resurrect_empty_entities() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        let bare = world.spawn();
        let full = world.spawn();
        world.set(full, health, 1).unwrap();
        let snapshot = world.snapshot(None).unwrap();
        assert!(snapshot.contains(bare));

        world.despawn(bare);
        world.despawn(full);
        world.revert(&snapshot);

        assert!(!world.valid(bare));
        assert!(world.valid(full));
        assert_eq!(world.get(full, health), Some(1));
    }

    #[test]
    fn test_full_revert_clears_components_of_empty_live_entity() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        let e = world.spawn();
        let snapshot = world.snapshot(None).unwrap();
        world.set(e, health, 3).unwrap();
        world.revert(&snapshot);
        assert!(world.valid(e));
        assert!(!world.has(e, health));
    }

    #[test]
    fn test_partial_snapshot_omits_entities_without_filtered_components() {
        let Fixture {
            mut world,
            health,
            name,
            ..
        } = fixture();
        let a = world.spawn();
        let b = world.spawn();
        world.set(a, health, 1).unwrap();
        world.set(a, name, "a".into()).unwrap();
        world.set(b, name, "b".into()).unwrap();

        let snapshot = world.snapshot(Some(&[health.raw()])).unwrap();
        assert!(snapshot.is_partial());
        assert_eq!(snapshot.filter(), Some(&[health.raw()][..]));
        assert_eq!(snapshot.entities(), vec![a]);
        assert_eq!(snapshot.value(a, name.raw()), None);
    }

    #[test]
    fn test_partial_snapshot_with_no_matches_still_exists() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        world.spawn();
        let snapshot = world.snapshot(Some(&[health.raw()])).unwrap();
        assert_eq!(snapshot.entity_count(), 0);
    }

    #[test]
    fn test_empty_filter_is_full() {
        let mut world = World::new();
        world.spawn();
        assert!(world.snapshot(Some(&[])).unwrap().is_full());
    }

    #[test]
    fn test_partial_revert_touches_only_filtered_components() {
        let Fixture {
            mut world,
            health,
            name,
            ..
        } = fixture();
        let a = world.spawn();
        let b = world.spawn();
        world.set(a, health, 100).unwrap();
        world.set(a, name, "a".into()).unwrap();
        world.set(b, name, "b".into()).unwrap();
        let snapshot = world.snapshot(Some(&[health.raw()])).unwrap();

        world.set(a, health, 1).unwrap();
        world.set(a, name, "renamed".into()).unwrap();
        world.set(b, health, 7).unwrap();
        let extra = world.spawn();
        world.set(extra, name, "extra".into()).unwrap();

        world.revert(&snapshot);

        assert_eq!(world.get(a, health), Some(100));
        assert_eq!(world.get(a, name), Some("renamed".to_string()));
        // Not captured, so left alone.
        assert_eq!(world.get(b, health), Some(7));
        assert!(world.valid(extra));
        assert_eq!(world.get(extra, name), Some("extra".to_string()));
    }

    #[test]
    fn test_partial_revert_respawns_captured_entity() {
        let Fixture {
            mut world,
            health,
            name,
            ..
        } = fixture();
        let a = world.spawn();
        world.set(a, health, 50).unwrap();
        world.set(a, name, "a".into()).unwrap();
        let snapshot = world.snapshot(Some(&[health.raw()])).unwrap();

        world.despawn(a);
        world.revert(&snapshot);

        assert!(world.valid(a));
        assert_eq!(world.get(a, health), Some(50));
        assert!(!world.has(a, name));
    }

    #[test]
    fn test_revert_reports_restored_components_as_added() {
        let Fixture {
            mut world,
            health,
            name,
            ..
        } = fixture();
        let e = world.spawn();
        world.set(e, health, 10).unwrap();
        world.set(e, name, "e".into()).unwrap();
        let snapshot = world.snapshot(None).unwrap();
        world.remove(e, name);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        world.events().any.connect(move |event| sink.borrow_mut().push(*event));
        world.revert(&snapshot);

        // Health is unchanged but still reported.
        assert_eq!(
            *log.borrow(),
            vec![
                WorldEvent::ComponentAdded(e, health.raw()),
                WorldEvent::ComponentAdded(e, name.raw()),
            ]
        );
    }

    #[test]
    fn test_revert_respawn_emits_spawn_then_components() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        let keep = world.spawn();
        let e = world.spawn();
        world.set(e, health, 10).unwrap();
        let snapshot = world.snapshot(None).unwrap();
        world.despawn(e);

        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        world.events().any.connect(move |event| sink.borrow_mut().push(*event));
        world.revert(&snapshot);

        assert!(world.valid(keep));
        assert_eq!(
            *log.borrow(),
            vec![
                WorldEvent::EntitySpawned(e),
                WorldEvent::ComponentAdded(e, health.raw()),
            ]
        );
        // Restoring does not advance the entity allocator.
        let next = world.spawn();
        assert!(next > e);
    }

    #[test]
    fn test_full_revert_despawns_with_group_detachment() {
        let Fixture { mut world, .. } = fixture();
        let keep = world.spawn();
        let snapshot = world.snapshot(None).unwrap();
        let late = world.spawn();
        let g = world.create_group();
        world.add_to_group(g, late).unwrap();

        world.revert(&snapshot);
        assert!(world.valid(keep));
        assert!(!world.valid(late));
        assert!(world.group(g).unwrap().is_empty());
    }

    #[test]
    fn test_full_revert_rejoins_captured_groups() {
        let Fixture {
            mut world,
            health,
            name,
            ..
        } = fixture();
        let e = world.spawn();
        world.set(e, health, 10).unwrap();
        let red = world.create_group();
        world.group_mut(red).unwrap().set(name, "red".into()).unwrap();
        world.add_to_group(red, e).unwrap();
        let snapshot = world.snapshot(None).unwrap();
        assert_eq!(snapshot.groups_of(e), vec![red]);

        world.despawn(e);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        world.events().any.connect(move |event| sink.borrow_mut().push(*event));
        world.revert(&snapshot);

        assert!(world.has(e, name));
        assert_eq!(world.get(e, name), Some("red".to_string()));
        assert_eq!(world.groups_for_entity(e), vec![red]);
        assert!(world.group(red).unwrap().has_entity(e));
        assert_eq!(
            *log.borrow(),
            vec![
                WorldEvent::EntitySpawned(e),
                WorldEvent::ComponentAdded(e, health.raw()),
                WorldEvent::EntityAddedToGroup(e, red),
            ]
        );
    }

    #[test]
    fn test_full_revert_leaves_groups_joined_since() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        let e = world.spawn();
        world.set(e, health, 1).unwrap();
        let old = world.create_group();
        world.add_to_group(old, e).unwrap();
        let snapshot = world.snapshot(None).unwrap();

        let late = world.create_group();
        world.add_to_group(late, e).unwrap();
        world.remove_group(old);
        world.revert(&snapshot);

        assert!(world.groups_for_entity(e).is_empty());
        assert!(world.group(late).unwrap().is_empty());
        assert!(world.group(old).is_none());
    }

    #[test]
    fn test_partial_revert_leaves_membership_alone() {
        let Fixture {
            mut world, health, ..
        } = fixture();
        let e = world.spawn();
        world.set(e, health, 1).unwrap();
        let g = world.create_group();
        world.add_to_group(g, e).unwrap();
        let snapshot = world.snapshot(Some(&[health.raw()])).unwrap();
        assert!(snapshot.groups_of(e).is_empty());

        let h = world.create_group();
        world.add_to_group(h, e).unwrap();
        world.revert(&snapshot);

        assert_eq!(world.groups_for_entity(e), vec![g, h]);
    }
}
