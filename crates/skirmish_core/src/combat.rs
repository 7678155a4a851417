//! Weapons, projectiles, and static defenses.
//!
//! Shooting is timer driven: an armed entity accumulates one tick of
//! cooldown per tick spent in range of its target and fires when the
//! weapon's cooldown is reached. Projectiles home on their target and are
//! discarded if the target disappears first.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::config::{SimConfig, WeaponStats};
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::targeting::{acquire_target, is_valid_target, TargetQuery};
use crate::world::World;

/// Combat events emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A weapon discharged.
    Fired {
        /// Shooter.
        shooter: EntityId,
        /// Intended target.
        target: EntityId,
        /// Projectile spawned, if the weapon is not instant.
        projectile: Option<EntityId>,
    },
    /// Damage landed on an entity.
    Damaged {
        /// Entity hit.
        target: EntityId,
        /// Damage actually applied.
        amount: u32,
        /// Faction that dealt it.
        by: Faction,
    },
    /// A projectile lost its target and vanished.
    Fizzled {
        /// Projectile id.
        projectile: EntityId,
    },
}

/// Accumulate one tick of cooldown. Returns `true` when the weapon fires,
/// resetting the timer.
pub fn ready_to_fire(timer: &mut u32, weapon: &WeaponStats) -> bool {
    *timer = timer.saturating_add(1);
    if *timer >= weapon.cooldown_ticks {
        *timer = 0;
        true
    } else {
        false
    }
}

/// Discharge `weapon` from `origin` at `target`.
///
/// Instant weapons damage the target immediately; others launch a
/// projectile that resolves in later ticks.
pub fn fire(
    world: &mut World,
    shooter: EntityId,
    faction: Faction,
    origin: Vec2Fixed,
    target: EntityId,
    weapon: &WeaponStats,
    events: &mut Vec<CombatEvent>,
) {
    match weapon.projectile_step() {
        Some(speed) => {
            let projectile = world.add_projectile(faction, origin, target, speed, weapon.damage);
            events.push(CombatEvent::Fired {
                shooter,
                target,
                projectile: Some(projectile),
            });
        }
        None => {
            events.push(CombatEvent::Fired {
                shooter,
                target,
                projectile: None,
            });
            if let Some(amount) = world.damage(target, weapon.damage) {
                events.push(CombatEvent::Damaged {
                    target,
                    amount,
                    by: faction,
                });
            }
        }
    }
}

/// Move every projectile one step; apply damage on impact and drop
/// projectiles whose target is gone.
pub fn advance_projectiles(world: &mut World, config: &SimConfig) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    let hit_radius = Fixed::from_num(config.projectile_hit_radius);

    for id in world.projectile_ids() {
        let Some(projectile) = world.projectile(id) else {
            continue;
        };
        let target = projectile.target;
        let target_position = world
            .entity(target)
            .filter(|e| e.health().is_some_and(|h| !h.is_dead()))
            .map(|e| e.position());

        let Some(target_position) = target_position else {
            world.remove_projectile(id);
            events.push(CombatEvent::Fizzled { projectile: id });
            continue;
        };

        let next = projectile.position.move_towards(target_position, projectile.speed);
        if next.within(target_position, hit_radius) {
            if let Some(hit) = world.remove_projectile(id) {
                if let Some(amount) = world.damage(target, hit.damage) {
                    events.push(CombatEvent::Damaged {
                        target,
                        amount,
                        by: hit.faction,
                    });
                }
            }
        } else if let Some(projectile) = world.projectile_mut(id) {
            projectile.position = next;
        }
    }

    events
}

/// One tick of a static defense: keep a valid in-range target, rescan on
/// the building's scan interval, and fire on cooldown. Never moves.
pub fn step_defense(world: &mut World, config: &SimConfig, building_id: EntityId) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    let Some(building) = world.building(building_id) else {
        return events;
    };
    if !building.is_complete() || building.health.is_dead() {
        return events;
    }
    let stats = config.buildings.get(building.kind);
    let (Some(weapon), Some(mut mount)) = (stats.weapon, building.weapon) else {
        return events;
    };

    let query = TargetQuery {
        origin: building.position,
        faction: building.faction,
        range: weapon.range_fixed(),
        hits_air: weapon.hits_air,
    };
    let faction = building.faction;

    let in_range = |world: &World, target: EntityId| {
        is_valid_target(world, &query, target)
            && world
                .entity(target)
                .is_some_and(|e| e.position().within(query.origin, query.range))
    };

    mount.scan_timer = mount.scan_timer.saturating_add(1);
    if mount.target.is_some_and(|t| !in_range(world, t)) {
        mount.target = None;
    }
    if mount.target.is_none() && mount.scan_timer >= stats.scan_interval_ticks {
        mount.scan_timer = 0;
        mount.target = acquire_target(world, &query, &config.priorities);
    }

    if let Some(target) = mount.target {
        if ready_to_fire(&mut mount.shot_timer, &weapon) {
            fire(world, building_id, faction, query.origin, target, &weapon, &mut events);
        }
    }

    if let Some(building) = world.building_mut(building_id) {
        building.weapon = Some(mount);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingKind, UnitKind};

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_ready_to_fire_cycles() {
        let weapon = SimConfig::default().units.infantry.weapon.unwrap();
        let mut timer = 0;
        let shots = (0..weapon.cooldown_ticks * 3)
            .filter(|_| ready_to_fire(&mut timer, &weapon))
            .count();
        assert_eq!(shots, 3);
    }

    #[test]
    fn test_projectile_travels_and_hits() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let target = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(100, 0), &config);
        world.add_projectile(Faction::Player, pos(0, 0), target, Fixed::from_num(15), 15);

        let mut damage = 0;
        for _ in 0..10 {
            for event in advance_projectiles(&mut world, &config) {
                if let CombatEvent::Damaged { amount, .. } = event {
                    damage += amount;
                }
            }
        }
        assert_eq!(damage, 15);
        assert_eq!(world.projectiles().count(), 0);
        assert_eq!(world.unit(target).unwrap().health.current, 35);
    }

    #[test]
    fn test_projectile_fizzles_when_target_gone() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let target = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(100, 0), &config);
        let projectile = world.add_projectile(Faction::Player, pos(0, 0), target, Fixed::from_num(15), 15);
        world.damage(target, 1000);
        world.remove_dead();

        let events = advance_projectiles(&mut world, &config);
        assert_eq!(events, vec![CombatEvent::Fizzled { projectile }]);
        assert_eq!(world.projectiles().count(), 0);
    }

    #[test]
    fn test_instant_weapon_damages_immediately() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let target = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(5, 0), &config);
        let weapon = config.units.worker.weapon.unwrap();
        let mut events = Vec::new();
        fire(&mut world, 99, Faction::Player, pos(0, 0), target, &weapon, &mut events);
        assert_eq!(world.unit(target).unwrap().health.current, 45);
        assert_eq!(world.projectiles().count(), 0);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_turret_acquires_and_fires() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let turret =
            world.add_completed_building(BuildingKind::Turret, Faction::Player, pos(0, 0), &config);
        let enemy = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(50, 0), &config);

        let mut fired = 0;
        for _ in 0..40 {
            fired += step_defense(&mut world, &config, turret)
                .iter()
                .filter(|e| matches!(e, CombatEvent::Fired { .. }))
                .count();
        }
        assert!(fired >= 2);
        assert_eq!(world.building(turret).unwrap().weapon.unwrap().target, Some(enemy));
        assert_eq!(world.building(turret).unwrap().position, pos(0, 0));
    }

    #[test]
    fn test_unfinished_turret_is_inert() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let turret = world.add_building(BuildingKind::Turret, Faction::Player, pos(0, 0), &config);
        world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(50, 0), &config);
        for _ in 0..40 {
            assert!(step_defense(&mut world, &config, turret).is_empty());
        }
    }
}
