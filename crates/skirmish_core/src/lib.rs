//! # Skirmish Core
//!
//! Deterministic simulation core for a two-faction RTS skirmish: one human
//! side, one scripted opponent.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond loading a config file
//! - No system randomness (one seeded `StdRng` per match)
//! - No floating-point math (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`world`] - Entity registries, spatial queries, dead-entity purge
//! - [`components`] - Units, buildings, resource nodes, projectiles
//! - [`worker`] / [`units`] - Per-unit state machines
//! - [`buildings`] - Construction, production and defense per tick
//! - [`targeting`] - Priority target selection
//! - [`economy`] / [`production`] - Pools, costs, queues
//! - [`planner`] - Scripted opponent
//! - [`commands`] - External orders and the command buffer
//! - [`simulation`] - The tick loop and win condition
//! - [`snapshot`] - Read-only projection for observers
//! - [`config`] - Tunable parameters, loaded from RON

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod buildings;
pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod factions;
pub mod math;
pub mod planner;
pub mod production;
pub mod scenario;
pub mod simulation;
pub mod snapshot;
pub mod targeting;
pub mod units;
pub mod worker;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{Command, CommandQueue, IssuedCommand, RejectedCommand};
    pub use crate::components::*;
    pub use crate::config::{Cost, SimConfig};
    pub use crate::economy::{EconomyEvent, ResourcePool};
    pub use crate::error::{CommandError, ErrorClass, GameError, Result};
    pub use crate::factions::Faction;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::planner::{OpponentPlanner, PlannerEvent};
    pub use crate::production::{ProductionEvent, ProductionQueue};
    pub use crate::simulation::{MatchOutcome, Simulation, TickEvents, TICK_RATE};
    pub use crate::snapshot::WorldSnapshot;
    pub use crate::world::World;
}
