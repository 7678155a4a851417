//! Headless match runner for batch play and CI verification.
//!
//! Plays seeded standard matches without rendering and reports on them as
//! JSON. Three entry points:
//!
//! - **run**: one match, with an optional final snapshot
//! - **batch**: many seeds in parallel, summarised
//! - **verify**: the same seed several times, compared by state hash
//!
//! # Example
//!
//! ```bash
//! # One match on hard difficulty, 10 minutes of game time
//! cargo run -p skirmish_headless -- run --seed 7 --difficulty hard --max-ticks 12000
//!
//! # 100 seeds in parallel
//! cargo run -p skirmish_headless -- batch --count 100 --seed 0
//!
//! # Determinism check
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Reports go to stdout; logs go to stderr.

pub mod batch;
pub mod error;
pub mod report;
pub mod runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary, VerifyReport};
pub use error::{HeadlessError, Result};
pub use report::{FactionReport, MatchRecorder, MatchReport};
pub use runner::{run_match, Difficulty, RunConfig};
