//! Per-unit state machines.
//!
//! Each tick every living unit is stepped once, in id order. A step may
//! chain several instantaneous transitions (Idle -> AttackMove -> Attacking)
//! but moves the unit at most once. The unit being stepped is lifted out
//! of the world for the duration of its step so it can read and mutate
//! everything else freely.
//!
//! Workers run [`crate::worker`]; combat units run the engagement machine
//! below, which workers also use while under an attack order.

use serde::{Deserialize, Serialize};

use crate::combat::{fire, ready_to_fire, CombatEvent};
use crate::components::{EntityId, Unit, UnitKind, UnitState};
use crate::config::SimConfig;
use crate::economy::EconomyEvent;
use crate::math::{Fixed, Vec2Fixed};
use crate::targeting::{acquire_target, is_valid_target, TargetQuery};
use crate::world::World;
use crate::worker;

/// Upper bound on instantaneous transitions per unit per tick.
pub(crate) const MAX_TRANSITIONS: usize = 4;

/// Events produced while stepping units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEvents {
    /// Gathering and deposits.
    pub economy: Vec<EconomyEvent>,
    /// Shots and hits.
    pub combat: Vec<CombatEvent>,
}

/// Whether a step has already spent its single movement.
#[derive(Debug, Default)]
pub(crate) struct Motion {
    moved: bool,
}

impl Motion {
    /// Move `unit` toward `target` unless it is already within `radius` or
    /// has moved this tick. Returns whether it ends within `radius`.
    pub(crate) fn approach(
        &mut self,
        unit: &mut Unit,
        target: Vec2Fixed,
        radius: Fixed,
        step: Fixed,
    ) -> bool {
        if unit.position.within(target, radius) {
            return true;
        }
        if self.moved {
            return false;
        }
        self.moved = true;
        unit.position = unit.position.move_towards(target, step);
        unit.position.within(target, radius)
    }
}

/// Step every living unit once.
pub fn step_units(world: &mut World, config: &SimConfig) -> UnitEvents {
    let mut events = UnitEvents::default();
    for id in world.unit_ids() {
        let Some(mut unit) = world.take_unit(id) else {
            continue;
        };
        if !unit.health.is_dead() {
            let before = unit.state;
            step_unit(&mut unit, world, config, &mut events);
            if unit.state.label() != before.label() {
                tracing::trace!(unit = id, from = before.label(), to = unit.state.label(), "Unit state");
            }
        }
        world.restore_unit(unit);
    }
    events
}

fn step_unit(unit: &mut Unit, world: &mut World, config: &SimConfig, events: &mut UnitEvents) {
    match unit.kind {
        UnitKind::Worker => worker::step_worker(unit, world, config, events),
        UnitKind::Infantry | UnitKind::Vehicle | UnitKind::Aircraft => {
            let mut motion = Motion::default();
            step_engagement(unit, world, config, &mut motion, &mut events.combat);
        }
    }
}

/// Switch `unit` to `state`, giving up any gather slot the old state held
/// and no longer holds.
pub(crate) fn set_state(unit: &mut Unit, world: &mut World, state: UnitState) {
    let old_node = unit.state.gather_node();
    if old_node.is_some() && old_node != state.gather_node() {
        world.release_gather_slot(unit.id, old_node);
    }
    unit.state = state;
}

/// Engagement machine shared by combat units and workers under attack
/// orders: Idle, Moving, AttackMove and Attacking.
///
/// Only combat units acquire targets on their own from Idle.
pub(crate) fn step_engagement(
    unit: &mut Unit,
    world: &mut World,
    config: &SimConfig,
    motion: &mut Motion,
    combat: &mut Vec<CombatEvent>,
) {
    let stats = config.units.get(unit.kind);
    let step = stats.step();
    let arrival = Fixed::from_num(config.worker.arrival_radius);
    let weapon = stats.weapon;
    let acquisition = TargetQuery {
        origin: unit.position,
        faction: unit.faction,
        range: Fixed::from_num(stats.acquisition_range),
        hits_air: weapon.is_some_and(|w| w.hits_air),
    };
    let scan = |world: &World, origin: Vec2Fixed| -> Option<EntityId> {
        weapon?;
        acquire_target(world, &TargetQuery { origin, ..acquisition }, &config.priorities)
    };

    for _ in 0..MAX_TRANSITIONS {
        match unit.state {
            UnitState::Idle => {
                if unit.kind.is_combat() {
                    if let Some(target) = scan(world, unit.position) {
                        unit.state = UnitState::Attacking {
                            target,
                            resume: None,
                        };
                        continue;
                    }
                }
                return;
            }
            UnitState::Moving { destination } => {
                if motion.approach(unit, destination, arrival, step) {
                    unit.state = UnitState::Idle;
                }
                return;
            }
            UnitState::AttackMove { destination } => {
                if let Some(target) = scan(world, unit.position) {
                    unit.state = UnitState::Attacking {
                        target,
                        resume: Some(destination),
                    };
                    continue;
                }
                if motion.approach(unit, destination, arrival, step) {
                    unit.state = UnitState::Idle;
                }
                return;
            }
            UnitState::Attacking { target, resume } => {
                let Some(weapon) = weapon else {
                    unit.state = resume.map_or(UnitState::Idle, |destination| UnitState::AttackMove {
                        destination,
                    });
                    return;
                };
                let query = TargetQuery {
                    origin: unit.position,
                    ..acquisition
                };
                let target_position = is_valid_target(world, &query, target)
                    .then(|| world.entity(target).map(|e| e.position()))
                    .flatten();
                let Some(target_position) = target_position else {
                    unit.state = match scan(world, unit.position) {
                        Some(next) => UnitState::Attacking {
                            target: next,
                            resume,
                        },
                        None => resume.map_or(UnitState::Idle, |destination| {
                            UnitState::AttackMove { destination }
                        }),
                    };
                    continue;
                };

                let range = weapon.range_fixed();
                if !unit.position.within(target_position, range) {
                    motion.approach(unit, target_position, range, step);
                    return;
                }
                if ready_to_fire(&mut unit.shot_timer, &weapon) {
                    fire(world, unit.id, unit.faction, unit.position, target, &weapon, combat);
                }
                return;
            }
            _ => return,
        }
    }
}
