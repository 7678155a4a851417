//! Headless skirmish runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match and print its report
//! cargo run -p skirmish_headless -- run --seed 42 --snapshot results/final.json
//!
//! # Run a batch of seeds in parallel
//! cargo run -p skirmish_headless -- batch --count 200 --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5 --ticks 6000
//!
//! # Print the default config as RON
//! cargo run -p skirmish_headless -- config --difficulty hard
//! ```
//!
//! Reports (stdout): JSON
//! Logs (stderr): human-readable, filtered by `RUST_LOG`

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_core::config::SimConfig;
use skirmish_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    error::Result,
    runner::{run_match, Difficulty, RunConfig, DEFAULT_TICK_LIMIT},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless RTS skirmish runner for batch play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match against the scripted opponent
    Run {
        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Match seed (overrides the config)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Tick limit (overrides the config)
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Opponent difficulty (overrides the config)
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,

        /// Write the final snapshot to this JSON file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Play many seeds in parallel
    Batch {
        /// Number of matches
        #[arg(short = 'n', long, default_value = "16")]
        count: u32,

        /// Seed of the first match
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Tick limit per match
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Opponent difficulty
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,

        /// Save full results to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play one seed several times and compare state hashes
    Verify {
        /// Seed to verify
        #[arg(short, long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "6000")]
        ticks: u64,

        /// RON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as RON
    Config {
        /// Opponent difficulty
        #[arg(short, long, value_enum)]
        difficulty: Option<Difficulty>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            config,
            seed,
            max_ticks,
            difficulty,
            snapshot,
        }) => cmd_run(config, seed, max_ticks, difficulty, snapshot),
        Some(Commands::Batch {
            count,
            seed,
            max_ticks,
            parallel,
            config,
            difficulty,
            output,
        }) => cmd_batch(count, seed, max_ticks, parallel, config, difficulty, output),
        Some(Commands::Verify {
            seed,
            runs,
            ticks,
            config,
        }) => cmd_verify(seed, runs, ticks, config),
        Some(Commands::Config { difficulty }) => cmd_config(difficulty),
        None => cmd_run(None, None, None, None, None),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Play one match and print its report.
fn cmd_run(
    config: Option<PathBuf>,
    seed: Option<u64>,
    max_ticks: Option<u64>,
    difficulty: Option<Difficulty>,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    let mut run = RunConfig::load(config.as_deref(), seed, max_ticks, difficulty)?;
    run.snapshot_path = snapshot;
    tracing::info!(seed = run.sim.seed, tick_limit = run.tick_limit, "Starting match");

    let report = run_match(&run)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Play a batch and print its summary.
fn cmd_batch(
    count: u32,
    seed: u64,
    max_ticks: Option<u64>,
    parallel: usize,
    config: Option<PathBuf>,
    difficulty: Option<Difficulty>,
    output: Option<PathBuf>,
) -> Result<()> {
    let base = RunConfig::load(config.as_deref(), None, max_ticks, difficulty)?;
    let mut batch = BatchConfig::new(count, seed).with_tick_limit(base.tick_limit);
    batch.parallel = parallel;
    batch.sim = base.sim;

    let results = run_batch(batch);
    if let Some(path) = &output {
        results.save(path)?;
        tracing::info!(path = %path.display(), "Results saved");
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.total_matches);
    eprintln!("Player wins:    {}", summary.player_wins);
    eprintln!("Opponent wins:  {}", summary.opponent_wins);
    eprintln!("Draws:          {}", summary.draws);
    eprintln!("Undecided:      {}", summary.undecided);
    eprintln!("Avg length:     {:.0} ticks", summary.avg_ticks);
    eprintln!("Runtime:        {:.1}s", results.duration_seconds);

    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Verify determinism; exits non-zero on divergence.
fn cmd_verify(seed: u64, runs: u32, ticks: u64, config: Option<PathBuf>) -> Result<()> {
    let sim = match config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    tracing::info!(seed, runs, ticks, "Verifying determinism");

    let report = verify_determinism(&sim, seed, runs, ticks);
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.deterministic {
        tracing::info!(hash = report.hashes.first().copied().unwrap_or_default(), "All runs agree");
        Ok(())
    } else {
        eprintln!("FAILED: {runs} runs of seed {seed} produced different hashes");
        std::process::exit(2);
    }
}

/// Print the default config as RON.
fn cmd_config(difficulty: Option<Difficulty>) -> Result<()> {
    let mut config = SimConfig::default();
    config.max_ticks = Some(DEFAULT_TICK_LIMIT);
    if let Some(difficulty) = difficulty {
        config.planner = difficulty.planner();
    }
    println!("{}", config.to_ron_string()?);
    Ok(())
}
