//! Single-match runner.
//!
//! Plays one seeded standard match with the opponent planner against a
//! passive player until it is decided or the tick limit runs out.

use std::path::{Path, PathBuf};

use skirmish_core::config::{PlannerConfig, SimConfig};
use skirmish_core::simulation::{Simulation, TICK_RATE};
use skirmish_core::snapshot::WorldSnapshot;

use crate::error::{HeadlessError, Result};
use crate::report::{MatchRecorder, MatchReport};

/// Tick limit when neither the command line nor the config sets one:
/// 20 minutes of game time.
pub const DEFAULT_TICK_LIMIT: u64 = 20 * 60 * TICK_RATE as u64;

/// Opponent difficulty presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Difficulty {
    /// Fewer workers, bigger and slower waves.
    Easy,
    /// Reference tuning.
    #[default]
    Normal,
    /// Faster ramp, frequent small waves.
    Hard,
}

impl Difficulty {
    /// Planner settings for this preset.
    #[must_use]
    pub fn planner(self) -> PlannerConfig {
        match self {
            Self::Easy => PlannerConfig::easy(),
            Self::Normal => PlannerConfig::default(),
            Self::Hard => PlannerConfig::hard(),
        }
    }
}

/// Everything needed to play one match.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Simulation parameters, seed included.
    pub sim: SimConfig,
    /// Stop after this many ticks if nobody has won.
    pub tick_limit: u64,
    /// Write the final snapshot here as JSON.
    pub snapshot_path: Option<PathBuf>,
}

impl RunConfig {
    /// Defaults with `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            sim: SimConfig::with_seed(seed),
            tick_limit: DEFAULT_TICK_LIMIT,
            snapshot_path: None,
        }
    }

    /// Build a run from an optional RON config file and command-line
    /// overrides.
    ///
    /// A `max_ticks` override also becomes the match's time cap, so a
    /// capped match is settled by HQ ownership instead of left undecided.
    pub fn load(
        config_path: Option<&Path>,
        seed: Option<u64>,
        max_ticks: Option<u64>,
        difficulty: Option<Difficulty>,
    ) -> Result<Self> {
        let mut sim = match config_path {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(seed) = seed {
            sim.seed = seed;
        }
        if let Some(difficulty) = difficulty {
            sim.planner = difficulty.planner();
        }
        if max_ticks.is_some() {
            sim.max_ticks = max_ticks;
        }
        let tick_limit = sim.max_ticks.unwrap_or(DEFAULT_TICK_LIMIT);
        Ok(Self {
            sim,
            tick_limit,
            snapshot_path: None,
        })
    }
}

/// Play a match to completion and report on it.
pub fn run_match(config: &RunConfig) -> Result<MatchReport> {
    let (report, snapshot) = play(config);
    if let Some(path) = &config.snapshot_path {
        write_snapshot(&snapshot, path)?;
    }
    Ok(report)
}

/// Play a match, returning the report and the final snapshot.
#[must_use]
pub fn play(config: &RunConfig) -> (MatchReport, WorldSnapshot) {
    let mut sim = Simulation::standard(config.sim.clone());
    let mut recorder = MatchRecorder::new();

    tracing::debug!(seed = config.sim.seed, tick_limit = config.tick_limit, "Match starting");
    while !sim.is_over() && sim.get_tick() < config.tick_limit {
        let events = sim.tick();
        recorder.record(&events);
    }

    let report = recorder.finish(&sim);
    tracing::info!(
        seed = report.seed,
        ticks = report.ticks,
        outcome = ?report.outcome,
        waves = report.waves,
        "Match finished"
    );
    (report, sim.snapshot())
}

/// Write `snapshot` as pretty JSON.
pub fn write_snapshot(snapshot: &WorldSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| HeadlessError::io(parent, e))?;
    }
    let json = snapshot.to_json()?;
    std::fs::write(path, json).map_err(|e| HeadlessError::io(path, e))?;
    tracing::debug!(path = %path.display(), entities = snapshot.entities.len(), "Snapshot written");
    Ok(())
}

/// Read a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<WorldSnapshot> {
    let text = std::fs::read_to_string(path).map_err(|e| HeadlessError::io(path, e))?;
    Ok(WorldSnapshot::from_json(&text)?)
}
