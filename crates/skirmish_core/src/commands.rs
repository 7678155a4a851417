//! External commands and the per-tick command buffer.
//!
//! Commands may arrive at any time but only take effect when the
//! simulation drains the buffer at the start of a tick, so every command
//! issued within one tick observes the same world.
//!
//! Issuing a command overwrites whatever the named units were doing. There
//! is no per-unit order history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, Unit, UnitKind, UnitState};
use crate::config::SimConfig;
use crate::economy::{assign_builder, found_building};
use crate::error::CommandError;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::production::enqueue;
use crate::units::set_state;
use crate::world::{EntityRef, World};
use crate::worker::is_usable;

/// An order from one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Walk to a point, ignoring enemies.
    Move {
        /// Units to move.
        units: Vec<EntityId>,
        /// Destination.
        to: Vec2Fixed,
    },
    /// Walk to a point, engaging anything met on the way.
    AttackMove {
        /// Units to move.
        units: Vec<EntityId>,
        /// Destination.
        to: Vec2Fixed,
    },
    /// Focus a specific enemy.
    Attack {
        /// Attackers.
        units: Vec<EntityId>,
        /// Enemy unit or building.
        target: EntityId,
    },
    /// Mine a specific node.
    Gather {
        /// Workers to send.
        workers: Vec<EntityId>,
        /// Mineral patch or geyser.
        node: EntityId,
    },
    /// Queue a unit at a production building.
    Enqueue {
        /// Producing building.
        building: EntityId,
        /// Unit type.
        unit: UnitKind,
    },
    /// Found a new building with a worker.
    Build {
        /// Worker that will construct it.
        worker: EntityId,
        /// Building type.
        kind: BuildingKind,
        /// Placement point.
        at: Vec2Fixed,
    },
    /// Send a worker to finish an unfinished building.
    Construct {
        /// Worker.
        worker: EntityId,
        /// Unfinished building.
        site: EntityId,
    },
    /// Send a worker to repair a damaged building.
    Repair {
        /// Worker.
        worker: EntityId,
        /// Damaged building.
        target: EntityId,
    },
    /// Drop the current order.
    Stop {
        /// Units to stop.
        units: Vec<EntityId>,
    },
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::AttackMove { .. } => "attack_move",
            Self::Attack { .. } => "attack",
            Self::Gather { .. } => "gather",
            Self::Enqueue { .. } => "enqueue",
            Self::Build { .. } => "build",
            Self::Construct { .. } => "construct",
            Self::Repair { .. } => "repair",
            Self::Stop { .. } => "stop",
        }
    }
}

/// A command tagged with the side that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCommand {
    /// Issuing faction.
    pub faction: Faction,
    /// The order.
    pub command: Command,
}

/// A command that was refused, reported back to its issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCommand {
    /// Issuing faction.
    pub faction: Faction,
    /// The refused order.
    pub command: Command,
    /// Why it was refused.
    pub error: CommandError,
}

/// Buffer of commands waiting for the next tick boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandQueue {
    pending: VecDeque<IssuedCommand>,
    disconnected: [bool; 2],
}

impl CommandQueue {
    /// Empty buffer with both sides connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a command. Returns `false` if the faction has disconnected,
    /// in which case the command is discarded.
    pub fn submit(&mut self, faction: Faction, command: Command) -> bool {
        if self.disconnected[faction.index()] {
            tracing::debug!(%faction, command = command.name(), "Dropping command from disconnected faction");
            return false;
        }
        self.pending.push_back(IssuedCommand { faction, command });
        true
    }

    /// Stop accepting commands from `faction`. The match continues without
    /// further input from that side.
    pub fn disconnect(&mut self, faction: Faction) {
        if !self.disconnected[faction.index()] {
            tracing::warn!(%faction, "Faction disconnected");
        }
        self.disconnected[faction.index()] = true;
    }

    /// Whether `faction` can still issue commands.
    #[must_use]
    pub const fn is_connected(&self, faction: Faction) -> bool {
        !self.disconnected[faction.index()]
    }

    /// Commands waiting for the next tick.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending command in arrival order.
    pub fn drain(&mut self) -> Vec<IssuedCommand> {
        self.pending.drain(..).collect()
    }
}

fn owned_unit(world: &World, faction: Faction, id: EntityId) -> Result<&Unit, CommandError> {
    let unit = world
        .unit(id)
        .filter(|u| !u.health.is_dead())
        .ok_or(CommandError::UnknownEntity(id))?;
    if unit.faction != faction {
        return Err(CommandError::NotOwned(id));
    }
    Ok(unit)
}

fn owned_worker(world: &World, faction: Faction, id: EntityId) -> Result<&Unit, CommandError> {
    let unit = owned_unit(world, faction, id)?;
    if unit.kind != UnitKind::Worker {
        return Err(CommandError::WrongUnitKind {
            unit: id,
            kind: unit.kind,
        });
    }
    Ok(unit)
}

/// Put a unit into `state`, releasing whatever gather slot it held.
fn reassign(world: &mut World, id: EntityId, state: UnitState) {
    if let Some(mut unit) = world.take_unit(id) {
        set_state(&mut unit, world, state);
        world.restore_unit(unit);
    }
}

/// Apply `order` to each listed unit. Ids that fail are skipped and
/// logged; the command fails only if no unit accepted it.
fn for_each_unit(
    world: &mut World,
    faction: Faction,
    units: &[EntityId],
    mut order: impl FnMut(&mut World, EntityId) -> Result<(), CommandError>,
) -> Result<(), CommandError> {
    let mut first_error = None;
    let mut accepted = 0_usize;
    for &id in units {
        match owned_unit(world, faction, id).map(|_| ()).and_then(|()| order(world, id)) {
            Ok(()) => accepted += 1,
            Err(e) => {
                tracing::debug!(unit = id, %faction, error = %e, "Unit skipped order");
                first_error.get_or_insert(e);
            }
        }
    }
    if accepted > 0 {
        Ok(())
    } else {
        Err(first_error.unwrap_or(CommandError::EmptySelection))
    }
}

fn order_attack(world: &mut World, config: &SimConfig, id: EntityId, target: EntityId) -> Result<(), CommandError> {
    let unit = world.unit(id).ok_or(CommandError::UnknownEntity(id))?;
    let weapon = config
        .units
        .get(unit.kind)
        .weapon
        .ok_or(CommandError::WrongUnitKind {
            unit: id,
            kind: unit.kind,
        })?;
    let hittable = match world.entity(target) {
        Some(EntityRef::Unit(t)) => {
            t.faction != unit.faction && !t.health.is_dead() && (weapon.hits_air || !t.kind.is_air())
        }
        Some(EntityRef::Building(b)) => b.faction != unit.faction && !b.health.is_dead(),
        Some(EntityRef::Node(_)) => false,
        None => return Err(CommandError::UnknownEntity(target)),
    };
    if !hittable {
        return Err(CommandError::InvalidTarget(target));
    }
    reassign(world, id, UnitState::Attacking { target, resume: None });
    Ok(())
}

fn order_gather(world: &mut World, faction: Faction, id: EntityId, node: EntityId) -> Result<(), CommandError> {
    owned_worker(world, faction, id)?;
    let target = world.node(node).ok_or(CommandError::UnknownEntity(node))?;
    if !is_usable(world, target, faction) {
        return Err(CommandError::InvalidTarget(node));
    }
    if !target.is_assigned(id) && !target.has_free_slot() {
        return Err(CommandError::NodeFull {
            node,
            cap: target.cap,
        });
    }
    if let Some(n) = world.node_mut(node) {
        n.assign(id);
    }
    reassign(world, id, UnitState::MovingToResource { node });
    Ok(())
}

fn order_repair(world: &mut World, faction: Faction, id: EntityId, target: EntityId) -> Result<(), CommandError> {
    let worker = owned_worker(world, faction, id)?;
    if matches!(worker.state, UnitState::Retreating { .. }) {
        return Err(CommandError::UnitBusy(id));
    }
    let building = world
        .building(target)
        .filter(|b| !b.health.is_dead())
        .ok_or(CommandError::UnknownEntity(target))?;
    if building.faction != faction {
        return Err(CommandError::NotOwned(target));
    }
    if !building.is_complete() {
        return Err(CommandError::NotConstructed(target));
    }
    if building.health.is_full() {
        return Err(CommandError::FullHealth(target));
    }
    reassign(world, id, UnitState::Repairing { target });
    Ok(())
}

/// Apply one command on behalf of `faction`.
///
/// A rejected command leaves the world exactly as it was, except that a
/// multi-unit order still applies to the units that accepted it.
pub fn apply_command(
    world: &mut World,
    config: &SimConfig,
    faction: Faction,
    command: &Command,
) -> Result<(), CommandError> {
    let limit = Fixed::from_num(config.world_size);
    match command {
        Command::Move { units, to } => {
            let destination = to.clamp_to(limit);
            for_each_unit(world, faction, units, |world, id| {
                reassign(world, id, UnitState::Moving { destination });
                Ok(())
            })
        }
        Command::AttackMove { units, to } => {
            let destination = to.clamp_to(limit);
            for_each_unit(world, faction, units, |world, id| {
                reassign(world, id, UnitState::AttackMove { destination });
                Ok(())
            })
        }
        Command::Attack { units, target } => {
            for_each_unit(world, faction, units, |world, id| {
                order_attack(world, config, id, *target)
            })
        }
        Command::Gather { workers, node } => {
            for_each_unit(world, faction, workers, |world, id| {
                order_gather(world, faction, id, *node)
            })
        }
        Command::Enqueue { building, unit } => {
            enqueue(world, config, faction, *building, *unit).map(|_| ())
        }
        Command::Build { worker, kind, at } => {
            found_building(world, config, faction, *worker, *kind, *at).map(|_| ())
        }
        Command::Construct { worker, site } => assign_builder(world, faction, *worker, *site),
        Command::Repair { worker, target } => order_repair(world, faction, *worker, *target),
        Command::Stop { units } => for_each_unit(world, faction, units, |world, id| {
            reassign(world, id, UnitState::Idle);
            Ok(())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ResourceKind;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_queue_drains_in_order() {
        let mut queue = CommandQueue::new();
        assert!(queue.submit(Faction::Player, Command::Stop { units: vec![1] }));
        assert!(queue.submit(Faction::Opponent, Command::Stop { units: vec![2] }));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].faction, Faction::Player);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_disconnected_faction_is_ignored() {
        let mut queue = CommandQueue::new();
        queue.disconnect(Faction::Player);
        assert!(!queue.submit(Faction::Player, Command::Stop { units: vec![1] }));
        assert!(queue.submit(Faction::Opponent, Command::Stop { units: vec![2] }));
        assert_eq!(queue.len(), 1);
        assert!(!queue.is_connected(Faction::Player));
        assert!(queue.is_connected(Faction::Opponent));
    }

    #[test]
    fn test_move_clamps_destination() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let marine = world.add_unit(UnitKind::Infantry, Faction::Player, pos(10, 10), &config);
        apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Move {
                units: vec![marine],
                to: pos(5000, -20),
            },
        )
        .unwrap();
        assert_eq!(
            world.unit(marine).unwrap().state,
            UnitState::Moving {
                destination: pos(2000, 0)
            }
        );
    }

    #[test]
    fn test_foreign_units_are_not_owned() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let enemy = world.add_unit(UnitKind::Infantry, Faction::Opponent, pos(10, 10), &config);
        let before = world.clone();
        let err = apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Stop { units: vec![enemy] },
        )
        .unwrap_err();
        assert_eq!(err, CommandError::NotOwned(enemy));
        assert_eq!(world, before);
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let marine = world.add_unit(UnitKind::Infantry, Faction::Player, pos(10, 10), &config);
        apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::AttackMove {
                units: vec![999, marine],
                to: pos(100, 100),
            },
        )
        .unwrap();
        assert_eq!(
            world.unit(marine).unwrap().state,
            UnitState::AttackMove {
                destination: pos(100, 100)
            }
        );
        assert_eq!(
            apply_command(
                &mut world,
                &config,
                Faction::Player,
                &Command::Stop { units: vec![] }
            ),
            Err(CommandError::EmptySelection)
        );
    }

    #[test]
    fn test_gather_respects_cap() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let node = world.add_node(ResourceKind::Minerals, pos(100, 100), &config);
        let workers: Vec<_> = (0..3)
            .map(|i| world.add_unit(UnitKind::Worker, Faction::Player, pos(10, i), &config))
            .collect();

        apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Gather {
                workers: workers.clone(),
                node,
            },
        )
        .unwrap();
        assert_eq!(world.node(node).unwrap().gatherers, workers[..2].to_vec());
        assert_eq!(world.unit(workers[2]).unwrap().state, UnitState::Idle);

        let err = apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Gather {
                workers: vec![workers[2]],
                node,
            },
        )
        .unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::CapacityExceeded);
    }

    #[test]
    fn test_stop_releases_gather_slot() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let node = world.add_node(ResourceKind::Minerals, pos(100, 100), &config);
        let worker = world.add_unit(UnitKind::Worker, Faction::Player, pos(10, 10), &config);
        let gather = Command::Gather {
            workers: vec![worker],
            node,
        };
        apply_command(&mut world, &config, Faction::Player, &gather).unwrap();
        apply_command(&mut world, &config, Faction::Player, &Command::Stop { units: vec![worker] }).unwrap();
        assert!(world.node(node).unwrap().gatherers.is_empty());
    }

    #[test]
    fn test_attack_requires_hostile_target() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let marine = world.add_unit(UnitKind::Infantry, Faction::Player, pos(10, 10), &config);
        let friend = world.add_unit(UnitKind::Infantry, Faction::Player, pos(20, 10), &config);
        let foe = world.add_unit(UnitKind::Worker, Faction::Opponent, pos(30, 10), &config);

        let err = apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Attack {
                units: vec![marine],
                target: friend,
            },
        )
        .unwrap_err();
        assert_eq!(err, CommandError::InvalidTarget(friend));

        apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Attack {
                units: vec![marine],
                target: foe,
            },
        )
        .unwrap();
        assert_eq!(
            world.unit(marine).unwrap().state,
            UnitState::Attacking {
                target: foe,
                resume: None
            }
        );
    }

    #[test]
    fn test_repair_rejects_full_health() {
        let config = SimConfig::default();
        let mut world = World::new(0);
        let worker = world.add_unit(UnitKind::Worker, Faction::Player, pos(10, 10), &config);
        let hq = world.add_completed_building(BuildingKind::Hq, Faction::Player, pos(0, 0), &config);
        let repair = Command::Repair { worker, target: hq };
        assert_eq!(
            apply_command(&mut world, &config, Faction::Player, &repair),
            Err(CommandError::FullHealth(hq))
        );
        world.damage(hq, 100);
        apply_command(&mut world, &config, Faction::Player, &repair).unwrap();
        assert_eq!(world.unit(worker).unwrap().state, UnitState::Repairing { target: hq });
    }

    #[test]
    fn test_combat_unit_cannot_build() {
        let config = SimConfig::default();
        let mut world = World::new(1000);
        let marine = world.add_unit(UnitKind::Infantry, Faction::Player, pos(10, 10), &config);
        let err = apply_command(
            &mut world,
            &config,
            Faction::Player,
            &Command::Build {
                worker: marine,
                kind: BuildingKind::Barracks,
                at: pos(100, 100),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::WrongUnitKind { .. }));
        assert_eq!(world.pool(Faction::Player).minerals, 1000);
    }
}
