//! Match reports.
//!
//! A [`MatchRecorder`] watches the events of every tick and folds them into
//! per-faction totals; [`MatchRecorder::finish`] combines those with the
//! final world state into a [`MatchReport`].

use serde::{Deserialize, Serialize};
use skirmish_core::combat::CombatEvent;
use skirmish_core::components::UnitKind;
use skirmish_core::factions::Faction;
use skirmish_core::planner::PlannerEvent;
use skirmish_core::production::ProductionEvent;
use skirmish_core::simulation::{MatchOutcome, Simulation, TickEvents};

/// End-of-match totals for one faction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionReport {
    /// Faction name.
    pub faction: String,
    /// Minerals in the pool at the end.
    pub minerals: u32,
    /// Gas in the pool at the end.
    pub gas: u32,
    /// Minerals brought back by workers over the match.
    pub deposited_minerals: u32,
    /// Gas brought back by workers over the match.
    pub deposited_gas: u32,
    /// Minerals spent on production and construction.
    pub spent_minerals: u32,
    /// Workers alive at the end.
    pub workers: usize,
    /// Combat units alive at the end.
    pub combat_units: usize,
    /// Buildings standing at the end, finished or not.
    pub buildings: usize,
    /// Units produced over the match.
    pub units_produced: u32,
    /// Buildings completed over the match.
    pub buildings_completed: u32,
    /// Damage landed on the enemy.
    pub damage_dealt: u64,
    /// Commands refused.
    pub commands_rejected: u32,
}

/// Result of one headless match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Match seed.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Outcome, if the match was decided within the tick limit.
    pub outcome: Option<MatchOutcome>,
    /// Winning faction name, if any.
    pub winner: Option<String>,
    /// Attack waves the opponent launched.
    pub waves: u32,
    /// Tick of the first wave.
    pub first_wave_tick: Option<u64>,
    /// Player totals, then opponent totals.
    pub factions: Vec<FactionReport>,
    /// Final state hash, for determinism checks.
    pub final_state_hash: u64,
}

impl MatchReport {
    /// Totals for `faction`.
    #[must_use]
    pub fn faction(&self, faction: Faction) -> Option<&FactionReport> {
        self.factions.get(faction.index())
    }

    /// Whether the match ended with a winner or a draw.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Accumulates tick events into a report.
#[derive(Debug, Clone, Default)]
pub struct MatchRecorder {
    factions: [FactionReport; 2],
    waves: u32,
    first_wave_tick: Option<u64>,
}

impl MatchRecorder {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick's events in.
    pub fn record(&mut self, events: &TickEvents) {
        for event in &events.production {
            if let ProductionEvent::Completed { faction, .. } = event {
                self.factions[faction.index()].units_produced += 1;
            }
        }
        for completed in &events.completed {
            self.factions[completed.faction.index()].buildings_completed += 1;
        }
        for event in &events.combat {
            if let CombatEvent::Damaged { amount, by, .. } = event {
                self.factions[by.index()].damage_dealt += u64::from(*amount);
            }
        }
        for rejected in &events.rejected {
            self.factions[rejected.faction.index()].commands_rejected += 1;
        }
        for event in &events.planner {
            if matches!(event, PlannerEvent::WaveLaunched { .. }) {
                self.waves += 1;
                self.first_wave_tick.get_or_insert(events.tick);
            }
        }
    }

    /// Build the report from the recorded totals and the final state.
    #[must_use]
    pub fn finish(self, sim: &Simulation) -> MatchReport {
        let world = sim.world();
        let factions = Faction::ALL
            .map(|faction| {
                let pool = world.pool(faction);
                FactionReport {
                    faction: faction.to_string(),
                    minerals: pool.minerals,
                    gas: pool.gas,
                    deposited_minerals: pool.deposited_minerals,
                    deposited_gas: pool.deposited_gas,
                    spent_minerals: pool.spent_minerals,
                    workers: world.unit_count(faction, UnitKind::Worker),
                    combat_units: world.combat_unit_count(faction),
                    buildings: world.total_buildings(faction),
                    ..self.factions[faction.index()].clone()
                }
            })
            .to_vec();

        let outcome = sim.outcome();
        MatchReport {
            seed: sim.config().seed,
            ticks: sim.get_tick(),
            outcome,
            winner: match outcome {
                Some(MatchOutcome::Victory(faction)) => Some(faction.to_string()),
                _ => None,
            },
            waves: self.waves,
            first_wave_tick: self.first_wave_tick,
            factions,
            final_state_hash: sim.state_hash(),
        }
    }
}
