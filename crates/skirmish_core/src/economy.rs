//! Resource pools and building placement.
//!
//! A faction's pool changes in exactly three ways: a worker deposits cargo,
//! a production order is paid for at enqueue time, or a building is paid
//! for at placement. The pool keeps a ledger of the first and the other two
//! so conservation can be checked at any tick.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, Cargo, EntityId, ResourceKind, UnitKind, UnitState};
use crate::config::{Cost, SimConfig};
use crate::error::CommandError;
use crate::factions::Faction;
use crate::math::{Fixed, Vec2Fixed};
use crate::world::World;

/// A faction's stockpile plus its running ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Minerals on hand.
    pub minerals: u32,
    /// Gas on hand.
    pub gas: u32,
    /// Minerals at match start.
    pub initial_minerals: u32,
    /// Minerals deposited by workers so far.
    pub deposited_minerals: u32,
    /// Gas deposited by workers so far.
    pub deposited_gas: u32,
    /// Minerals spent so far.
    pub spent_minerals: u32,
    /// Gas spent so far.
    pub spent_gas: u32,
}

impl ResourcePool {
    /// Pool holding `minerals` and no gas.
    #[must_use]
    pub const fn new(minerals: u32) -> Self {
        Self {
            minerals,
            gas: 0,
            initial_minerals: minerals,
            deposited_minerals: 0,
            deposited_gas: 0,
            spent_minerals: 0,
            spent_gas: 0,
        }
    }

    /// Whether the pool covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.minerals >= cost.minerals && self.gas >= cost.gas
    }

    /// Deduct `cost`, or leave the pool untouched and explain why not.
    pub fn spend(&mut self, cost: Cost) -> Result<(), CommandError> {
        if !self.can_afford(cost) {
            return Err(CommandError::InsufficientFunds {
                required: cost.minerals,
                required_gas: cost.gas,
                available: self.minerals,
                available_gas: self.gas,
            });
        }
        self.minerals -= cost.minerals;
        self.gas -= cost.gas;
        self.spent_minerals += cost.minerals;
        self.spent_gas += cost.gas;
        Ok(())
    }

    /// Add a worker's cargo.
    pub fn deposit(&mut self, cargo: Cargo) {
        match cargo.kind {
            ResourceKind::Minerals => {
                self.minerals += cargo.amount;
                self.deposited_minerals += cargo.amount;
            }
            ResourceKind::Gas => {
                self.gas += cargo.amount;
                self.deposited_gas += cargo.amount;
            }
        }
    }

    /// Whether the balance matches the ledger.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        let minerals = self.initial_minerals as u64 + self.deposited_minerals as u64;
        let gas = self.deposited_gas as u64;
        minerals == self.minerals as u64 + self.spent_minerals as u64
            && gas == self.gas as u64 + self.spent_gas as u64
    }
}

/// Economy-related events emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A worker finished a gather cycle.
    Gathered {
        /// The worker.
        worker: EntityId,
        /// The node.
        node: EntityId,
        /// Amount extracted.
        amount: u32,
    },
    /// A worker emptied its cargo at a depot.
    Deposited {
        /// The worker.
        worker: EntityId,
        /// The depot.
        depot: EntityId,
        /// Owning faction.
        faction: Faction,
        /// Resource deposited.
        kind: ResourceKind,
        /// Amount deposited.
        amount: u32,
    },
    /// A node ran dry.
    NodeDepleted {
        /// The node.
        node: EntityId,
    },
    /// A building was placed and paid for.
    BuildingFounded {
        /// The new building.
        building: EntityId,
        /// Its type.
        kind: BuildingKind,
        /// Owning faction.
        faction: Faction,
    },
}

/// Check that `worker` is a living worker of `faction` able to take a
/// construction order.
fn validate_builder(world: &World, faction: Faction, worker: EntityId) -> Result<(), CommandError> {
    let unit = world.unit(worker).ok_or(CommandError::UnknownEntity(worker))?;
    if unit.faction != faction {
        return Err(CommandError::NotOwned(worker));
    }
    if unit.health.is_dead() {
        return Err(CommandError::UnknownEntity(worker));
    }
    if unit.kind != UnitKind::Worker {
        return Err(CommandError::WrongUnitKind {
            unit: worker,
            kind: unit.kind,
        });
    }
    if matches!(unit.state, UnitState::Retreating { .. }) {
        return Err(CommandError::UnitBusy(worker));
    }
    Ok(())
}

/// Put `worker` on construction duty for `site`, releasing any gather slot.
fn send_to_site(world: &mut World, worker: EntityId, site: EntityId) {
    let previous = world.unit(worker).and_then(|u| u.state.gather_node());
    world.release_gather_slot(worker, previous);
    if let Some(unit) = world.unit_mut(worker) {
        unit.state = UnitState::Building { site };
    }
    if let Some(building) = world.building_mut(site) {
        building.builder = Some(worker);
    }
}

/// Place, pay for, and start constructing a building.
///
/// Refineries snap onto the nearest unclaimed geyser within the placement
/// radius and claim it.
pub fn found_building(
    world: &mut World,
    config: &SimConfig,
    faction: Faction,
    worker: EntityId,
    kind: BuildingKind,
    at: Vec2Fixed,
) -> Result<EntityId, CommandError> {
    validate_builder(world, faction, worker)?;

    let limit = Fixed::from_num(config.world_size);
    if at.x < Fixed::ZERO || at.y < Fixed::ZERO || at.x > limit || at.y > limit {
        return Err(CommandError::InvalidPlacement {
            kind,
            reason: "outside the playfield".into(),
        });
    }

    let mut position = at;
    let mut geyser = None;
    if kind == BuildingKind::Refinery {
        let radius = Fixed::from_num(config.nodes.refinery_placement_radius);
        let node = world
            .nodes()
            .filter(|n| n.kind == ResourceKind::Gas && n.refinery.is_none() && n.position.within(at, radius))
            .min_by_key(|n| (n.position.distance_squared(at), n.id))
            .ok_or_else(|| CommandError::InvalidPlacement {
                kind,
                reason: "no unclaimed geyser in range".into(),
            })?;
        position = node.position;
        geyser = Some(node.id);
    }

    world
        .pool_mut(faction)
        .spend(config.buildings.get(kind).cost)?;

    let id = world.add_building(kind, faction, position, config);
    if let Some(building) = world.building_mut(id) {
        building.geyser = geyser;
    }
    if let Some(node) = geyser.and_then(|g| world.node_mut(g)) {
        node.refinery = Some(id);
    }
    send_to_site(world, worker, id);

    tracing::debug!(building = id, ?kind, %faction, worker, "Building founded");
    Ok(id)
}

/// Assign `worker` to finish an existing unfinished building.
pub fn assign_builder(
    world: &mut World,
    faction: Faction,
    worker: EntityId,
    site: EntityId,
) -> Result<(), CommandError> {
    validate_builder(world, faction, worker)?;
    let building = world.building(site).ok_or(CommandError::UnknownEntity(site))?;
    if building.faction != faction {
        return Err(CommandError::NotOwned(site));
    }
    if building.is_complete() {
        return Err(CommandError::AlreadyComplete(site));
    }
    send_to_site(world, worker, site);
    Ok(())
}
