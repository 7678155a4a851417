//! # Skirmish Match Host
//!
//! Runs one match without rendering. Peers submit commands from any task
//! through a [`relay::PeerHandle`]; the [`host::MatchHost`] drains them into
//! the simulation once per tick and publishes snapshots to observers.
//!
//! The wire transport is left to the embedding binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod host;
pub mod relay;

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::config::SimConfig;
use skirmish_core::error::GameError;
use skirmish_core::simulation::TICK_RATE;
use thiserror::Error;

pub use host::{MatchHost, MatchSummary};
pub use relay::{CommandRelay, PeerHandle};

/// Errors from the match host.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Simulation config problem.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Server config could not be read.
    #[error("Failed to read server config '{path}': {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Server config could not be parsed.
    #[error("Failed to parse server config: {0}")]
    ConfigParse(String),

    /// Server config holds unusable values.
    #[error("Invalid server config: {0}")]
    InvalidConfig(String),

    /// The host has shut down; the command was not delivered.
    #[error("match host is gone")]
    HostClosed,
}

/// Result alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Ticks per second of wall-clock pacing.
    pub tick_rate: u32,
    /// Publish a snapshot every this many ticks.
    pub snapshot_interval: u64,
    /// Commands a peer may have in flight before `send` waits.
    pub command_buffer: usize,
    /// Stop after this many ticks even if the match is undecided.
    pub tick_limit: Option<u64>,
    /// The match itself.
    pub sim: SimConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            snapshot_interval: 10,
            command_buffer: 64,
            tick_limit: None,
            sim: SimConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse and validate a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| ServerError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Reject values the host cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(ServerError::InvalidConfig("tick_rate must be positive".into()));
        }
        if self.snapshot_interval == 0 {
            return Err(ServerError::InvalidConfig(
                "snapshot_interval must be positive".into(),
            ));
        }
        if self.command_buffer == 0 {
            return Err(ServerError::InvalidConfig(
                "command_buffer must be at least 1".into(),
            ));
        }
        self.sim.validate()?;
        Ok(())
    }

    /// Wall-clock duration of one tick.
    #[must_use]
    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / u64::from(self.tick_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paces_at_sim_rate() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.tick_duration(), std::time::Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = ServerConfig::from_ron_str("(tick_rate: 60, snapshot_interval: 3)").unwrap();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.snapshot_interval, 3);
        assert_eq!(config.command_buffer, 64);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ServerConfig::from_ron_str("(snapshot_interval: 0)").unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            ServerConfig::from_ron_str("not ron at all ("),
            Err(ServerError::ConfigParse(_))
        ));
    }
}
