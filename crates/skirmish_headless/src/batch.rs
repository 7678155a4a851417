//! Batch runner.
//!
//! Plays many seeds in parallel using rayon and summarises the outcomes.
//! Also hosts the determinism check: the same seed played several times
//! must end on the same state hash.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::config::SimConfig;
use skirmish_core::factions::Faction;
use skirmish_core::simulation::{MatchOutcome, Simulation};
use tracing::{debug, info, warn};

use crate::error::{HeadlessError, Result};
use crate::runner::{play, RunConfig, DEFAULT_TICK_LIMIT};
use crate::report::MatchReport;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches.
    pub match_count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per match.
    pub tick_limit: u64,
    /// Worker threads (0 = rayon default).
    pub parallel: usize,
    /// Base simulation parameters; the seed is overwritten per match.
    pub sim: SimConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            match_count: 16,
            seed_start: 0,
            tick_limit: DEFAULT_TICK_LIMIT,
            parallel: 0,
            sim: SimConfig::default(),
        }
    }
}

impl BatchConfig {
    /// `match_count` matches from `seed_start`.
    #[must_use]
    pub fn new(match_count: u32, seed_start: u64) -> Self {
        Self {
            match_count,
            seed_start,
            ..Self::default()
        }
    }

    /// Set the per-match tick limit.
    #[must_use]
    pub fn with_tick_limit(mut self, tick_limit: u64) -> Self {
        self.tick_limit = tick_limit;
        self
    }

    fn run_config(&self, index: u32) -> RunConfig {
        let mut sim = self.sim.clone();
        sim.seed = self.seed_start.wrapping_add(u64::from(index));
        RunConfig {
            sim,
            tick_limit: self.tick_limit,
            snapshot_path: None,
        }
    }
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub total_matches: u32,
    /// Matches the player won.
    pub player_wins: u32,
    /// Matches the opponent won.
    pub opponent_wins: u32,
    /// Matches decided as a draw.
    pub draws: u32,
    /// Matches still running at the tick limit.
    pub undecided: u32,
    /// Mean match length in ticks.
    pub avg_ticks: f64,
    /// Shortest match.
    pub min_ticks: u64,
    /// Longest match.
    pub max_ticks: u64,
    /// Mean number of opponent waves.
    pub avg_waves: f64,
    /// Mean tick of the first wave, over matches that had one.
    pub avg_first_wave_tick: Option<f64>,
}

impl BatchSummary {
    /// Summarise `reports`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_matches: u32::try_from(reports.len()).unwrap_or(u32::MAX),
            min_ticks: u64::MAX,
            ..Self::default()
        };
        let mut tick_sum = 0u64;
        let mut wave_sum = 0u64;
        let mut first_waves = Vec::new();

        for report in reports {
            match report.outcome {
                Some(MatchOutcome::Victory(Faction::Player)) => summary.player_wins += 1,
                Some(MatchOutcome::Victory(Faction::Opponent)) => summary.opponent_wins += 1,
                Some(MatchOutcome::Draw) => summary.draws += 1,
                None => summary.undecided += 1,
            }
            tick_sum += report.ticks;
            summary.min_ticks = summary.min_ticks.min(report.ticks);
            summary.max_ticks = summary.max_ticks.max(report.ticks);
            wave_sum += u64::from(report.waves);
            if let Some(tick) = report.first_wave_tick {
                first_waves.push(tick);
            }
        }

        let count = reports.len() as f64;
        summary.avg_ticks = tick_sum as f64 / count;
        summary.avg_waves = wave_sum as f64 / count;
        if !first_waves.is_empty() {
            let sum: u64 = first_waves.iter().sum();
            summary.avg_first_wave_tick = Some(sum as f64 / first_waves.len() as f64);
        }
        summary
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// One report per match, in seed order.
    pub reports: Vec<MatchReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HeadlessError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| HeadlessError::io(path, e))
    }

    /// Load results saved by [`BatchResults::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| HeadlessError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Play every match of a batch.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        matches = config.match_count,
        seed_start = config.seed_start,
        tick_limit = config.tick_limit,
        "Starting batch run"
    );

    let play_all = || -> Vec<MatchReport> {
        (0..config.match_count)
            .into_par_iter()
            .map(|i| {
                let (report, _) = play(&config.run_config(i));
                debug!(seed = report.seed, outcome = ?report.outcome, "Batch match done");
                report
            })
            .collect()
    };

    let reports = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel)
            .build()
        {
            Ok(pool) => pool.install(play_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global pool");
                play_all()
            }
        }
    } else {
        play_all()
    };

    let summary = BatchSummary::from_reports(&reports);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        matches = reports.len(),
        player_wins = summary.player_wins,
        opponent_wins = summary.opponent_wins,
        draws = summary.draws,
        undecided = summary.undecided,
        duration_secs = format!("{duration_seconds:.1}"),
        "Batch complete"
    );

    BatchResults {
        config,
        reports,
        summary,
        duration_seconds,
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed checked.
    pub seed: u64,
    /// Ticks per run.
    pub ticks: u64,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Whether all hashes agree.
    pub deterministic: bool,
}

/// Play `seed` `runs` times for `ticks` ticks on parallel threads and
/// compare final state hashes.
pub fn verify_determinism(sim: &SimConfig, seed: u64, runs: u32, ticks: u64) -> VerifyReport {
    let mut config = sim.clone();
    config.seed = seed;

    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .map(|_| {
            let mut sim = Simulation::standard(config.clone());
            sim.run(ticks);
            sim.state_hash()
        })
        .collect();
    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(seed, ?hashes, "Runs diverged");
    }

    VerifyReport {
        seed,
        ticks,
        hashes,
        deterministic,
    }
}
