//! The scripted demo scenario.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use engine_world::{Bundle, ComponentId, GroupId, Prefab, World};

/// A 2D position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Component handles used by the scenario.
#[derive(Debug, Clone, Copy)]
pub struct Components {
    pub health: ComponentId<u32>,
    pub position: ComponentId<Position>,
    pub team: ComponentId<String>,
}

/// What the scenario observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Live entities after populating.
    pub live: usize,
    /// Entities owning `Health`.
    pub with_health: usize,
    /// Entities owning `Health` but not `Position`.
    pub health_without_position: usize,
    /// Entities owning both.
    pub health_and_position: usize,
    /// Entities reading `Team == "red"`, own or shared.
    pub red_team: usize,
    /// Live entities after mutating, before the revert.
    pub before_revert: usize,
    /// Live entities after the revert.
    pub after_revert: usize,
}

/// Register the scenario's components.
pub fn register(world: &mut World) -> Result<Components> {
    Ok(Components {
        health: world.register_component("Health")?,
        position: world.register_component("Position")?,
        team: world.register_component("Team")?,
    })
}

/// Spawn `count` entities with a deterministic component mix.
///
/// Every unit has `Health`. Even-numbered units get a `Position`. Every
/// third unit joins the returned red group, which shares `Team = "red"`;
/// the rest carry their own `Team = "blue"`.
pub fn populate(world: &mut World, components: &Components, count: usize) -> Result<GroupId> {
    let red = world.create_group();
    world
        .group_mut(red)
        .context("red group vanished after creation")?
        .set(components.team, "red".to_string())?;

    let unit = Prefab::new("unit", Bundle::new().with(components.health, 100)?);
    for i in 0..count {
        let mut overrides = Bundle::new();
        if i % 2 == 0 {
            overrides = overrides.with(
                components.position,
                Position {
                    x: i as f32,
                    y: 0.0,
                },
            )?;
        }
        if i % 3 != 0 {
            overrides = overrides.with(components.team, "blue".to_string())?;
        }
        let entity = unit.spawn_with(world, &overrides)?;
        if i % 3 == 0 {
            world.add_to_group(red, entity)?;
        }
        debug!(entity = %entity, index = i, "spawned unit");
    }
    Ok(red)
}

/// Run the full scenario against `world`.
pub fn run(world: &mut World, count: usize) -> Result<Report> {
    let components = register(world)?;
    populate(world, &components, count)?;

    let mut report = Report {
        live: world.entity_count(),
        ..Report::default()
    };

    let health = components.health.raw();
    report.with_health = world.query([health]).count();
    report.health_without_position = world.query([health]).without(components.position).count();
    report.health_and_position = world.query([health]).with(components.position).count();
    report.red_team = world
        .entities()
        .into_iter()
        .filter(|&e| world.get(e, components.team).as_deref() == Some("red"))
        .count();

    let Some(snapshot) = world.snapshot(None) else {
        info!("empty world, skipping snapshot cycle");
        return Ok(report);
    };

    // Wound everyone, drop the first unit, and add a straggler.
    let rows = world.query([health]).collect();
    for row in rows {
        let current = row.get(components.health).unwrap_or_default();
        world.set(row.entity(), components.health, current.saturating_sub(30))?;
    }
    if let Some(first) = world.entities().first().copied() {
        world.despawn(first);
    }
    let straggler = world.spawn();
    world.set(straggler, components.health, 1)?;
    report.before_revert = world.entity_count();

    world.revert(&snapshot);
    report.after_revert = world.entity_count();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_counts() {
        let mut world = World::new();
        let report = run(&mut world, 6).unwrap();
        assert_eq!(report.live, 6);
        assert_eq!(report.with_health, 6);
        // Units 0, 2, 4 have a position.
        assert_eq!(report.health_and_position, 3);
        assert_eq!(report.health_without_position, 3);
        // Units 0 and 3 read red through the group.
        assert_eq!(report.red_team, 2);
        assert_eq!(report.before_revert, 6);
        assert_eq!(report.after_revert, 6);
    }

    #[test]
    fn test_revert_restores_health() {
        let mut world = World::new();
        run(&mut world, 4).unwrap();
        let health = world.registry().lookup("Health").unwrap();
        let values: Vec<_> = world
            .query([health])
            .map(|row| row.value(0).cloned());
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|v| v == &Some(serde_json::json!(100))));
    }

    #[test]
    fn test_empty_scenario_skips_snapshot() {
        let mut world = World::new();
        let report = run(&mut world, 0).unwrap();
        assert_eq!(report, Report::default());
    }
}
