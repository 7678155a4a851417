//! Entity data: the closed set of things that live in the world.
//!
//! These types are plain data. Behavior lives in [`crate::units`],
//! [`crate::buildings`], [`crate::production`] and [`crate::economy`];
//! ownership lives in [`crate::world::World`].

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{fixed_bits, Fixed, Vec2Fixed};
use crate::production::ProductionQueue;

/// Unique identifier shared by every entity kind.
pub type EntityId = u64;

/// Construction progress at which a building becomes active.
///
/// Progress is tracked in hundredths of a percent so slow passive rates
/// still advance by a whole step each tick.
pub const CONSTRUCTION_COMPLETE: u32 = 10_000;

/// Unit type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Gathers, builds and repairs.
    Worker,
    /// Cheap ground combat unit.
    Infantry,
    /// Heavy ground combat unit.
    Vehicle,
    /// Flying combat unit.
    Aircraft,
}

impl UnitKind {
    /// Every unit kind.
    pub const ALL: [UnitKind; 4] = [
        UnitKind::Worker,
        UnitKind::Infantry,
        UnitKind::Vehicle,
        UnitKind::Aircraft,
    ];

    /// Whether this kind runs the combat state machine.
    #[must_use]
    pub const fn is_combat(self) -> bool {
        !matches!(self, Self::Worker)
    }

    /// Whether this kind flies.
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Aircraft)
    }
}

/// Building type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Command structure: depot for cargo, produces workers.
    Hq,
    /// Produces infantry.
    Barracks,
    /// Produces vehicles.
    VehicleFactory,
    /// Produces aircraft.
    AirFactory,
    /// Static defense, long range.
    Turret,
    /// Static defense, sturdy.
    Bunker,
    /// Sits on a gas geyser and enables gas gathering.
    Refinery,
}

impl BuildingKind {
    /// Every building kind.
    pub const ALL: [BuildingKind; 7] = [
        BuildingKind::Hq,
        BuildingKind::Barracks,
        BuildingKind::VehicleFactory,
        BuildingKind::AirFactory,
        BuildingKind::Turret,
        BuildingKind::Bunker,
        BuildingKind::Refinery,
    ];

    /// Command structures are the lowest-priority targets and the cargo depots.
    #[must_use]
    pub const fn is_command(self) -> bool {
        matches!(self, Self::Hq)
    }
}

/// Resource type held by a node or carried as cargo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Mineral patch.
    Minerals,
    /// Gas geyser.
    Gas,
}

/// Health for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Dead at zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// At or above max.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal, returning the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.max.saturating_sub(self.current));
        self.current += actual;
        actual
    }

    /// Health as a whole percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            (u64::from(self.current) * 100 / u64::from(self.max)) as u32
        }
    }
}

/// Resources carried by a worker between node and depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cargo {
    /// Which pool the cargo is deposited into.
    pub kind: ResourceKind,
    /// Amount carried.
    pub amount: u32,
}

/// Behavioral state of a unit.
///
/// Each variant carries the only task target the unit holds, so switching
/// state drops every previous target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// No task.
    Idle,
    /// Plain move, no scanning.
    Moving {
        /// Destination point.
        destination: Vec2Fixed,
    },
    /// Walking to an assigned resource node.
    MovingToResource {
        /// Node holding this worker's slot.
        node: EntityId,
    },
    /// Extracting at a node.
    Gathering {
        /// Node holding this worker's slot.
        node: EntityId,
        /// Ticks spent in the current gather cycle.
        elapsed: u32,
    },
    /// Carrying cargo to a depot.
    MovingToDepot {
        /// Node to return to afterwards, if the worker is in a gather loop.
        node: Option<EntityId>,
        /// Depot (HQ) being walked to.
        depot: EntityId,
    },
    /// Walking to and constructing a building.
    Building {
        /// Building under construction.
        site: EntityId,
    },
    /// Walking to and repairing a friendly building.
    Repairing {
        /// Building being repaired.
        target: EntityId,
    },
    /// Low health: falling back to the nearest HQ and regenerating.
    Retreating {
        /// Ticks since the last regeneration step.
        regen_timer: u32,
    },
    /// Moving to a point while scanning for enemies.
    AttackMove {
        /// Order point.
        destination: Vec2Fixed,
    },
    /// Engaging a single target.
    Attacking {
        /// Current target.
        target: EntityId,
        /// Attack-move destination to resume once the target is gone.
        resume: Option<Vec2Fixed>,
    },
}

impl UnitState {
    /// Short label for snapshots and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving { .. } => "moving",
            Self::MovingToResource { .. } => "moving_to_resource",
            Self::Gathering { .. } => "gathering",
            Self::MovingToDepot { .. } => "returning_to_depot",
            Self::Building { .. } => "building",
            Self::Repairing { .. } => "repairing",
            Self::Retreating { .. } => "retreating",
            Self::AttackMove { .. } => "attack_move",
            Self::Attacking { .. } => "attacking",
        }
    }

    /// Node whose gatherer slot this state holds, if any.
    #[must_use]
    pub const fn gather_node(&self) -> Option<EntityId> {
        match *self {
            Self::MovingToResource { node } | Self::Gathering { node, .. } => Some(node),
            Self::MovingToDepot { node, .. } => node,
            _ => None,
        }
    }
}

/// A mobile entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Entity id.
    pub id: EntityId,
    /// Unit type.
    pub kind: UnitKind,
    /// Owning faction.
    pub faction: Faction,
    /// World position.
    pub position: Vec2Fixed,
    /// Health pool.
    pub health: Health,
    /// Current behavior.
    pub state: UnitState,
    /// Carried resources (workers only).
    pub cargo: Option<Cargo>,
    /// Ticks accumulated toward the next shot.
    pub shot_timer: u32,
}

impl Unit {
    /// Create an idle unit.
    #[must_use]
    pub fn new(id: EntityId, kind: UnitKind, faction: Faction, position: Vec2Fixed, max_health: u32) -> Self {
        Self {
            id,
            kind,
            faction,
            position,
            health: Health::new(max_health),
            state: UnitState::Idle,
            cargo: None,
            shot_timer: 0,
        }
    }

    /// Amount of cargo carried.
    #[must_use]
    pub fn cargo_amount(&self) -> u32 {
        self.cargo.map_or(0, |c| c.amount)
    }
}

/// Weapon bookkeeping for static defenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponMount {
    /// Current target.
    pub target: Option<EntityId>,
    /// Ticks accumulated toward the next shot.
    pub shot_timer: u32,
    /// Ticks since the last target scan.
    pub scan_timer: u32,
}

/// A static structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Entity id.
    pub id: EntityId,
    /// Building type.
    pub kind: BuildingKind,
    /// Owning faction.
    pub faction: Faction,
    /// World position (centre).
    pub position: Vec2Fixed,
    /// Health pool.
    pub health: Health,
    /// Construction progress in hundredths of a percent.
    pub progress: u32,
    /// Worker assigned to construct it. Weak: revalidated every use.
    pub builder: Option<EntityId>,
    /// Present only for production-capable types.
    pub production: Option<ProductionQueue>,
    /// Present only for armed types.
    pub weapon: Option<WeaponMount>,
    /// Geyser this refinery sits on.
    pub geyser: Option<EntityId>,
}

impl Building {
    /// Whether construction has finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress >= CONSTRUCTION_COMPLETE
    }

    /// Construction progress as a whole percentage (0-100).
    #[must_use]
    pub const fn completion_percent(&self) -> u32 {
        let clamped = if self.progress > CONSTRUCTION_COMPLETE {
            CONSTRUCTION_COMPLETE
        } else {
            self.progress
        };
        clamped / 100
    }
}

/// A mineral patch or gas geyser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Entity id.
    pub id: EntityId,
    /// Resource type.
    pub kind: ResourceKind,
    /// World position.
    pub position: Vec2Fixed,
    /// Amount left to extract.
    pub remaining: u32,
    /// Workers holding a gather slot, in assignment order. Weak.
    pub gatherers: Vec<EntityId>,
    /// Maximum concurrent gatherers.
    pub cap: usize,
    /// Refinery built on this geyser. Weak.
    pub refinery: Option<EntityId>,
}

impl ResourceNode {
    /// Nothing left to extract.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// At least one gatherer slot is open.
    #[must_use]
    pub fn has_free_slot(&self) -> bool {
        self.gatherers.len() < self.cap
    }

    /// Whether `worker` holds a slot here.
    #[must_use]
    pub fn is_assigned(&self, worker: EntityId) -> bool {
        self.gatherers.contains(&worker)
    }

    /// Take a slot for `worker`. Holding a slot already counts as success.
    pub fn assign(&mut self, worker: EntityId) -> bool {
        if self.is_assigned(worker) {
            return true;
        }
        if !self.has_free_slot() {
            return false;
        }
        self.gatherers.push(worker);
        true
    }

    /// Give up `worker`'s slot, if held.
    pub fn release(&mut self, worker: EntityId) {
        self.gatherers.retain(|&id| id != worker);
    }

    /// Remove up to `amount`, returning what was actually extracted.
    pub fn extract(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.remaining);
        self.remaining -= taken;
        taken
    }
}

/// A homing shot in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Entity id.
    pub id: EntityId,
    /// Firing faction.
    pub faction: Faction,
    /// Current position (starts at the shooter).
    pub position: Vec2Fixed,
    /// Target entity. Weak: the projectile fizzles if it is gone.
    pub target: EntityId,
    /// World units travelled per tick.
    #[serde(with = "fixed_bits")]
    pub speed: Fixed,
    /// Damage applied on impact.
    pub damage: u32,
}
