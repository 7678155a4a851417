//! # Skirmish Test Utilities
//!
//! Helpers shared by the workspace's test suites:
//! - [`fixtures`]: small hand-built worlds and a planner-free config
//! - [`determinism`]: replay and hash comparison, command scripts, and
//!   proptest strategies that generate them

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

pub use proptest;
