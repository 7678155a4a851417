//! Test fixtures and helpers.
//!
//! Small pre-built worlds and simulation helpers for consistent testing.

use fixed::types::I32F32;
use skirmish_core::components::{BuildingKind, EntityId, UnitKind};
use skirmish_core::config::SimConfig;
use skirmish_core::factions::Faction;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::simulation::{Simulation, TickEvents};
use skirmish_core::world::World;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Default config with the opponent planner switched off, so tests see
/// only what they set up.
#[must_use]
pub fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.planner.enabled = false;
    config
}

/// A world with one completed HQ per side in opposite corners and no
/// other entities.
#[derive(Debug, Clone)]
pub struct TwoBases {
    /// The world.
    pub world: World,
    /// Player HQ.
    pub player_hq: EntityId,
    /// Opponent HQ.
    pub opponent_hq: EntityId,
}

/// Two bare HQs at (100, 100) and (1900, 1900).
#[must_use]
pub fn two_bases(config: &SimConfig, starting_minerals: u32) -> TwoBases {
    let mut world = World::new(starting_minerals);
    let player_hq = world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(100, 100), config);
    let opponent_hq =
        world.add_completed_building(BuildingKind::Hq, Faction::Opponent, pos(1900, 1900), config);
    TwoBases {
        world,
        player_hq,
        opponent_hq,
    }
}

/// Two bases plus opposing squads of `count` units each, facing each other
/// across the centre of the map.
#[must_use]
pub fn skirmish_world(config: &SimConfig, kind: UnitKind, count: i32) -> TwoBases {
    let mut bases = two_bases(config, 0);
    for i in 0..count {
        bases
            .world
            .add_unit(kind, Faction::Player, pos(960, 900 + i * 12), config);
        bases
            .world
            .add_unit(kind, Faction::Opponent, pos(1040, 900 + i * 12), config);
    }
    bases
}

/// A simulation over [`skirmish_world`].
#[must_use]
pub fn skirmish_simulation(config: SimConfig, kind: UnitKind, count: i32) -> Simulation {
    let world = skirmish_world(&config, kind, count).world;
    Simulation::new(config, world)
}

/// Tick `sim` `ticks` times, collecting every tick's events.
pub fn run_ticks(sim: &mut Simulation, ticks: u64) -> Vec<TickEvents> {
    (0..ticks).map(|_| sim.tick()).collect()
}
