//! JSON rendering of a world, keyed by entity id and component name.

use serde_json::{Map, Value, json};

use engine_world::World;

/// Render every live entity's own components and group memberships.
pub fn world_to_json(world: &World) -> Value {
    let mut entities = Map::new();
    for entity in world.entities() {
        let mut components = Map::new();
        for component in world.components_of(entity).unwrap_or_default() {
            let name = world
                .registry()
                .name_of(component)
                .map_or_else(|| component.to_string(), str::to_string);
            if let Some(value) = world.get_value(entity, component) {
                components.insert(name, value.clone());
            }
        }
        let groups: Vec<u64> = world
            .groups_for_entity(entity)
            .into_iter()
            .map(|group| group.id())
            .collect();
        entities.insert(
            entity.id().to_string(),
            json!({ "components": components, "groups": groups }),
        );
    }
    json!({ "name": world.config().name, "entities": entities })
}
