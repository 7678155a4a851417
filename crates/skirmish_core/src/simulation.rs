//! Match clock.
//!
//! [`Simulation`] owns the world, the configuration, the seeded random
//! source, the opponent planner and the command buffer, and advances them
//! one fixed tick at a time.
//!
//! # Tick order
//!
//! 1. Drain buffered commands
//! 2. Buildings: construction, production, static defense
//! 3. Opponent planner
//! 4. Projectiles
//! 5. Units
//! 6. Purge dead entities
//! 7. Win check
//!
//! # Example
//!
//! ```
//! use skirmish_core::config::SimConfig;
//! use skirmish_core::simulation::Simulation;
//!
//! let mut sim = Simulation::standard(SimConfig::with_seed(7));
//! for _ in 0..100 {
//!     sim.tick();
//! }
//! assert_eq!(sim.get_tick(), 100);
//! assert!(sim.outcome().is_none());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::buildings::{step_buildings, ConstructionEvent};
use crate::combat::{advance_projectiles, CombatEvent};
use crate::commands::{apply_command, Command, CommandQueue, RejectedCommand};
use crate::components::{BuildingKind, EntityId};
use crate::config::SimConfig;
use crate::economy::EconomyEvent;
use crate::factions::Faction;
use crate::planner::{OpponentPlanner, PlannerEvent};
use crate::production::ProductionEvent;
use crate::scenario::standard_match;
use crate::snapshot::WorldSnapshot;
use crate::units::step_units;
use crate::world::{Removed, World};

/// Ticks per second.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One side won.
    Victory(Faction),
    /// Nobody won.
    Draw,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after this step.
    pub tick: u64,
    /// Units that entered the world.
    pub spawned: Vec<EntityId>,
    /// Buildings that finished construction.
    pub completed: Vec<ConstructionEvent>,
    /// Production queue activity.
    pub production: Vec<ProductionEvent>,
    /// Shots, hits and fizzles.
    pub combat: Vec<CombatEvent>,
    /// Gathering and deposits.
    pub economy: Vec<EconomyEvent>,
    /// Opponent decisions, including attack waves.
    pub planner: Vec<PlannerEvent>,
    /// Commands refused this tick.
    pub rejected: Vec<RejectedCommand>,
    /// Entities purged this tick.
    pub removed: Removed,
    /// Set on the tick the match is decided.
    pub outcome: Option<MatchOutcome>,
}

impl TickEvents {
    /// Total damage landed this tick.
    #[must_use]
    pub fn damage_dealt(&self) -> u64 {
        self.combat
            .iter()
            .map(|e| match e {
                CombatEvent::Damaged { amount, .. } => u64::from(*amount),
                _ => 0,
            })
            .sum()
    }

    /// Waves launched this tick.
    pub fn waves(&self) -> impl Iterator<Item = &PlannerEvent> {
        self.planner
            .iter()
            .filter(|e| matches!(e, PlannerEvent::WaveLaunched { .. }))
    }
}

/// A running match.
#[derive(Debug, Clone)]
pub struct Simulation {
    tick: u64,
    world: World,
    config: SimConfig,
    rng: StdRng,
    planner: OpponentPlanner,
    commands: CommandQueue,
    outcome: Option<MatchOutcome>,
}

impl Simulation {
    /// Start a match on an existing world.
    #[must_use]
    pub fn new(config: SimConfig, world: World) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let planner = OpponentPlanner::new(Faction::Opponent, &config.planner);
        tracing::debug!(seed = config.seed, max_ticks = ?config.max_ticks, "Simulation created");
        Self {
            tick: 0,
            world,
            config,
            rng,
            planner,
            commands: CommandQueue::new(),
            outcome: None,
        }
    }

    /// Start a match on the reference layout.
    #[must_use]
    pub fn standard(config: SimConfig) -> Self {
        let world = standard_match(&config).world;
        Self::new(config, world)
    }

    /// Ticks elapsed.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The opponent planner.
    #[must_use]
    pub const fn planner(&self) -> &OpponentPlanner {
        &self.planner
    }

    /// How the match ended, once it has.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Whether the match is decided.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Buffer a command for the next tick. Returns `false` if `faction`
    /// has disconnected.
    pub fn submit(&mut self, faction: Faction, command: Command) -> bool {
        self.commands.submit(faction, command)
    }

    /// Stop taking commands from `faction`.
    pub fn disconnect(&mut self, faction: Faction) {
        self.commands.disconnect(faction);
    }

    /// The command buffer.
    #[must_use]
    pub const fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    /// Advance one tick. After the match is decided this does nothing.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };
        if self.outcome.is_some() {
            return events;
        }

        // 1. Commands
        for issued in self.commands.drain() {
            if let Err(error) = apply_command(&mut self.world, &self.config, issued.faction, &issued.command) {
                tracing::debug!(
                    faction = %issued.faction,
                    command = issued.command.name(),
                    %error,
                    "Command rejected"
                );
                events.rejected.push(RejectedCommand {
                    faction: issued.faction,
                    command: issued.command,
                    error,
                });
            }
        }

        // 2. Buildings
        let buildings = step_buildings(&mut self.world, &self.config, &mut self.rng);
        events.completed = buildings.construction;
        events.production = buildings.production;
        events.combat = buildings.combat;

        // 3. Opponent
        events.planner = self
            .planner
            .step(&mut self.world, &self.config, &mut self.rng, self.tick);

        // 4. Projectiles
        events
            .combat
            .extend(advance_projectiles(&mut self.world, &self.config));

        // 5. Units
        let units = step_units(&mut self.world, &self.config);
        events.economy = units.economy;
        events.combat.extend(units.combat);

        // 6. Purge
        events.removed = self.world.remove_dead();

        self.tick += 1;
        events.tick = self.tick;
        events.spawned = events
            .production
            .iter()
            .filter_map(|e| match e {
                ProductionEvent::Completed { unit_id, .. } => Some(*unit_id),
                ProductionEvent::Queued { .. } => None,
            })
            .collect();

        // 7. Win check
        self.outcome = self.decide();
        events.outcome = self.outcome;
        if let Some(outcome) = self.outcome {
            tracing::info!(tick = self.tick, ?outcome, "Match decided");
        }

        #[cfg(feature = "debug-validation")]
        tracing::trace!(tick = self.tick, hash = self.state_hash(), "State hash");

        events
    }

    /// Tick until the match ends or `ticks` more ticks have run.
    pub fn run(&mut self, ticks: u64) -> Option<MatchOutcome> {
        for _ in 0..ticks {
            if self.is_over() {
                break;
            }
            self.tick();
        }
        self.outcome
    }

    fn decide(&self) -> Option<MatchOutcome> {
        let standing = Faction::ALL.map(|f| self.world.total_buildings(f) > 0);
        match standing {
            [false, false] => return Some(MatchOutcome::Draw),
            [true, false] => return Some(MatchOutcome::Victory(Faction::Player)),
            [false, true] => return Some(MatchOutcome::Victory(Faction::Opponent)),
            [true, true] => {}
        }

        let cap = self.config.max_ticks?;
        if self.tick < cap {
            return None;
        }
        let holds_hq = Faction::ALL.map(|f| self.world.find_building(BuildingKind::Hq, f).is_some());
        Some(match holds_hq {
            [true, false] => MatchOutcome::Victory(Faction::Player),
            [false, true] => MatchOutcome::Victory(Faction::Opponent),
            _ => MatchOutcome::Draw,
        })
    }

    /// Hash of the full match state, for desync detection.
    ///
    /// Two simulations built from the same config and fed the same
    /// commands hash identically at every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.world.hash(&mut hasher);
        self.planner.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        hasher.finish()
    }

    /// Read-only projection of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.tick, &self.world)
    }
}
