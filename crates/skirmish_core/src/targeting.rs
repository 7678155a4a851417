//! Target selection.
//!
//! Every hostile unit and building within range is ranked by priority
//! class first and distance second; the lowest pair wins. Class always
//! dominates distance: a far combat unit is shot before an adjacent worker.
//!
//! Candidates are gathered in world order (units by id, then buildings by
//! id) and sorted with a stable sort, so equal keys resolve identically on
//! every run.

use crate::components::EntityId;
use crate::config::TargetPriorities;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::world::{EntityRef, World};

/// Who is looking for a target, and how far it can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetQuery {
    /// Attacker position.
    pub origin: Vec2Fixed,
    /// Attacker faction; targets come from the other one.
    pub faction: Faction,
    /// Search radius.
    pub range: Fixed,
    /// Whether aircraft may be selected.
    pub hits_air: bool,
}

/// A ranked potential target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Target id.
    pub id: EntityId,
    /// Priority class (lower is preferred).
    pub priority: u8,
    /// Distance from the attacker.
    pub distance: Fixed,
}

fn priority_of(entity: &EntityRef<'_>, priorities: &TargetPriorities) -> Option<u8> {
    match entity {
        EntityRef::Unit(u) => Some(priorities.for_unit(u.kind)),
        EntityRef::Building(b) => Some(priorities.for_building(b.kind)),
        EntityRef::Node(_) => None,
    }
}

/// All valid targets for `query`, best first.
#[must_use]
pub fn rank_candidates(
    world: &World,
    query: &TargetQuery,
    priorities: &TargetPriorities,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = world
        .query_in_radius(query.origin, query.range, Some(query.faction.enemy()))
        .filter(|(entity, _)| entity.health().is_some_and(|h| !h.is_dead()))
        .filter(|(entity, _)| match entity {
            EntityRef::Unit(u) => query.hits_air || !u.kind.is_air(),
            _ => true,
        })
        .filter_map(|(entity, distance)| {
            priority_of(&entity, priorities).map(|priority| Candidate {
                id: entity.id(),
                priority,
                distance,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.distance.cmp(&b.distance))
    });
    candidates
}

/// The single best target for `query`, if any.
#[must_use]
pub fn acquire_target(
    world: &World,
    query: &TargetQuery,
    priorities: &TargetPriorities,
) -> Option<EntityId> {
    rank_candidates(world, query, priorities)
        .first()
        .map(|c| c.id)
}

/// Whether `target` is still worth shooting at from `query`'s point of
/// view: it exists, is alive, is hostile, and is hittable.
#[must_use]
pub fn is_valid_target(world: &World, query: &TargetQuery, target: EntityId) -> bool {
    match world.entity(target) {
        Some(EntityRef::Unit(u)) => {
            u.faction != query.faction
                && !u.health.is_dead()
                && (query.hits_air || !u.kind.is_air())
        }
        Some(EntityRef::Building(b)) => b.faction != query.faction && !b.health.is_dead(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingKind, UnitKind};
    use crate::config::SimConfig;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    fn query(range: i32) -> TargetQuery {
        TargetQuery {
            origin: pos(0, 0),
            faction: Faction::Player,
            range: Fixed::from_num(range),
            hits_air: true,
        }
    }

    #[test]
    fn test_empty_set_returns_none() {
        let world = World::new(0);
        let config = SimConfig::default();
        assert_eq!(acquire_target(&world, &query(80), &config.priorities), None);
    }

    #[test]
    fn test_infantry_beats_worker_at_equal_distance() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_unit(UnitKind::Worker, Faction::Opponent, pos(30, 0), &config);
        let infantry = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(0, 30), &config);
        assert_eq!(
            acquire_target(&world, &query(80), &config.priorities),
            Some(infantry)
        );
    }

    #[test]
    fn test_class_dominates_distance() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_unit(UnitKind::Worker, Faction::Opponent, pos(5, 0), &config);
        let far_infantry = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(70, 0), &config);
        assert_eq!(
            acquire_target(&world, &query(80), &config.priorities),
            Some(far_infantry)
        );
    }

    #[test]
    fn test_equal_class_prefers_closer() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_unit(UnitKind::Worker, Faction::Opponent, pos(60, 0), &config);
        let close = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(10, 0), &config);
        assert_eq!(
            acquire_target(&world, &query(80), &config.priorities),
            Some(close)
        );
    }

    #[test]
    fn test_full_ordering_of_classes() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let hq = world.add_completed_building(BuildingKind::Hq, Faction::Opponent, pos(10, 0), &config);
        let barracks =
            world.add_completed_building(BuildingKind::Barracks, Faction::Opponent, pos(20, 0), &config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(30, 0), &config);
        let vehicle = world.add_unit(UnitKind::Vehicle, Faction::Opponent, pos(40, 0), &config);

        let order: Vec<EntityId> = rank_candidates(&world, &query(80), &config.priorities)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(order, vec![vehicle, worker, barracks, hq]);
    }

    #[test]
    fn test_ground_only_skips_aircraft() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_unit(UnitKind::Aircraft, Faction::Opponent, pos(10, 0), &config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(50, 0), &config);
        let ground = TargetQuery {
            hits_air: false,
            ..query(80)
        };
        assert_eq!(acquire_target(&world, &ground, &config.priorities), Some(worker));
    }

    #[test]
    fn test_ignores_friendly_dead_and_out_of_range() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        world.add_unit(UnitKind::Infantry, Faction::Player, pos(5, 0), &config);
        let dead = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(6, 0), &config);
        world.damage(dead, 1000);
        world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(200, 0), &config);
        assert_eq!(acquire_target(&world, &query(80), &config.priorities), None);
    }

    #[test]
    fn test_repeated_calls_agree() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        for i in 0..6 {
            world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(20, i * 3), &config);
            world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(-20, i * 3), &config);
        }
        let first = acquire_target(&world, &query(80), &config.priorities);
        for _ in 0..10 {
            assert_eq!(acquire_target(&world, &query(80), &config.priorities), first);
        }
    }

    #[test]
    fn test_custom_priorities_respected() {
        let mut config = SimConfig::default();
        config.priorities.worker = 0;
        let mut world = World::new(0);
        world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(5, 0), &config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(60, 0), &config);
        assert_eq!(acquire_target(&world, &query(80), &config.priorities), Some(worker));
    }
}
