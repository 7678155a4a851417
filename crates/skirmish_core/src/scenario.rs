//! Reference match layout.

use crate::components::{BuildingKind, EntityId, ResourceKind, UnitKind};
use crate::config::SimConfig;
use crate::factions::Faction;
use crate::math::Vec2Fixed;
use crate::world::World;

/// Player HQ position.
pub const PLAYER_HQ: (i32, i32) = (300, 300);
/// Opponent HQ position.
pub const OPPONENT_HQ: (i32, i32) = (1700, 1700);
/// Player-side geyser.
pub const PLAYER_GEYSER: (i32, i32) = (500, 500);
/// Opponent-side geyser.
pub const OPPONENT_GEYSER: (i32, i32) = (1500, 1500);

/// Mineral patches around the player HQ: an open arc of radius 200 from
/// 30 to 270 degrees. The opponent arc is the same set reflected through
/// its own HQ.
const MINERAL_ARC: [(i32, i32); 10] = [
    (173, 100),
    (110, 167),
    (23, 199),
    (-68, 188),
    (-145, 137),
    (-192, 57),
    (-197, -35),
    (-160, -119),
    (-90, -179),
    (0, -200),
];

/// Starting workers, offset from the HQ on the side facing the map centre.
const WORKER_OFFSETS: [(i32, i32); 4] = [(40, 40), (50, 30), (30, 50), (55, 55)];

/// Ids of the entities every standard match starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardMatch {
    /// The populated world.
    pub world: World,
    /// HQ per faction, indexed by [`Faction::index`].
    pub hqs: [EntityId; 2],
    /// Starting workers per faction.
    pub workers: [Vec<EntityId>; 2],
    /// Mineral patches per faction side.
    pub minerals: [Vec<EntityId>; 2],
    /// Geyser per faction side.
    pub geysers: [EntityId; 2],
}

fn at(origin: (i32, i32), offset: (i32, i32), sign: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(origin.0 + sign * offset.0, origin.1 + sign * offset.1)
}

/// Build the reference skirmish: one HQ, four workers, ten mineral patches
/// and a geyser per side.
#[must_use]
pub fn standard_match(config: &SimConfig) -> StandardMatch {
    let mut world = World::new(config.starting_minerals);
    let mut hqs = [0; 2];
    let mut workers: [Vec<EntityId>; 2] = [Vec::new(), Vec::new()];
    let mut minerals: [Vec<EntityId>; 2] = [Vec::new(), Vec::new()];
    let mut geysers = [0; 2];

    for faction in Faction::ALL {
        let (hq, geyser, sign) = match faction {
            Faction::Player => (PLAYER_HQ, PLAYER_GEYSER, 1),
            Faction::Opponent => (OPPONENT_HQ, OPPONENT_GEYSER, -1),
        };
        let i = faction.index();
        hqs[i] = world.add_completed_building(BuildingKind::Hq, faction, at(hq, (0, 0), 1), config);
        workers[i] = WORKER_OFFSETS
            .iter()
            .map(|&offset| world.add_unit(UnitKind::Worker, faction, at(hq, offset, sign), config))
            .collect();
        minerals[i] = MINERAL_ARC
            .iter()
            .map(|&offset| world.add_node(ResourceKind::Minerals, at(hq, offset, sign), config))
            .collect();
        geysers[i] = world.add_node(ResourceKind::Gas, at(geyser, (0, 0), 1), config);
    }

    tracing::debug!(entities = world.units().count() + world.buildings().count() + world.nodes().count(), "Standard match laid out");
    StandardMatch {
        world,
        hqs,
        workers,
        minerals,
        geysers,
    }
}
