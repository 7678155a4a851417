//! Error types for the skirmish simulation.
//!
//! Two layers:
//! - [`GameError`] covers failures outside a running tick (configuration,
//!   serialization, bad lookups from embedding code).
//! - [`CommandError`] is the reason a queued command was rejected. Rejection
//!   never mutates the world; the simulation logs it and reports it back to
//!   the issuing faction through the tick events.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{BuildingKind, EntityId, UnitKind};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation crate.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Snapshot or state encoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Coarse classification of command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The command was invalid as issued (funds, ownership, kind mismatch).
    RejectedCommand,
    /// A referenced entity no longer exists.
    StaleReference,
    /// A slot or queue limit was hit; the caller may retry later.
    CapacityExceeded,
}

/// Reason a command was rejected without effect.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CommandError {
    /// Referenced entity id does not exist (never did, or already removed).
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    /// Entity belongs to the other faction.
    #[error("entity {0} is not owned by the issuing faction")]
    NotOwned(EntityId),

    /// Pool cannot cover the cost.
    #[error("insufficient funds: need {required} minerals/{required_gas} gas, have {available}/{available_gas}")]
    InsufficientFunds {
        /// Minerals required.
        required: u32,
        /// Gas required.
        required_gas: u32,
        /// Minerals available.
        available: u32,
        /// Gas available.
        available_gas: u32,
    },

    /// Production queue is at its configured depth.
    #[error("production queue of building {building} is full ({capacity})")]
    QueueFull {
        /// Building whose queue is full.
        building: EntityId,
        /// Configured depth.
        capacity: usize,
    },

    /// Resource node has no free gatherer slot.
    #[error("resource node {node} has no free gatherer slot ({cap})")]
    NodeFull {
        /// Node id.
        node: EntityId,
        /// Slot cap.
        cap: usize,
    },

    /// Building has not finished construction.
    #[error("building {0} is still under construction")]
    NotConstructed(EntityId),

    /// Building is already finished.
    #[error("building {0} is already complete")]
    AlreadyComplete(EntityId),

    /// Building is at full health and needs no repair.
    #[error("building {0} is at full health")]
    FullHealth(EntityId),

    /// Building type cannot produce the requested unit type.
    #[error("{building:?} cannot produce {unit:?}")]
    CannotProduce {
        /// Building type.
        building: BuildingKind,
        /// Requested unit type.
        unit: UnitKind,
    },

    /// The unit is the wrong kind for this order (e.g. a combat unit told to build).
    #[error("unit {unit} is a {kind:?} and cannot take this order")]
    WrongUnitKind {
        /// Unit id.
        unit: EntityId,
        /// Its kind.
        kind: UnitKind,
    },

    /// The unit is in a state that refuses this order.
    #[error("unit {0} is busy")]
    UnitBusy(EntityId),

    /// Building placement is not allowed at that point.
    #[error("cannot place {kind:?} there: {reason}")]
    InvalidPlacement {
        /// Building type.
        kind: BuildingKind,
        /// Human readable reason.
        reason: String,
    },

    /// The target is not something this order can act on.
    #[error("entity {0} is not a valid target")]
    InvalidTarget(EntityId),

    /// The command list named no entities.
    #[error("command names no entities")]
    EmptySelection,
}

impl CommandError {
    /// Classify this error for reporting.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownEntity(_) => ErrorClass::StaleReference,
            Self::QueueFull { .. } | Self::NodeFull { .. } => ErrorClass::CapacityExceeded,
            Self::NotOwned(_)
            | Self::InsufficientFunds { .. }
            | Self::NotConstructed(_)
            | Self::AlreadyComplete(_)
            | Self::FullHealth(_)
            | Self::CannotProduce { .. }
            | Self::WrongUnitKind { .. }
            | Self::UnitBusy(_)
            | Self::InvalidPlacement { .. }
            | Self::InvalidTarget(_)
            | Self::EmptySelection => ErrorClass::RejectedCommand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            CommandError::UnknownEntity(3).class(),
            ErrorClass::StaleReference
        );
        assert_eq!(
            CommandError::QueueFull {
                building: 1,
                capacity: 5
            }
            .class(),
            ErrorClass::CapacityExceeded
        );
        assert_eq!(
            CommandError::NodeFull { node: 1, cap: 2 }.class(),
            ErrorClass::CapacityExceeded
        );
        assert_eq!(
            CommandError::NotConstructed(9).class(),
            ErrorClass::RejectedCommand
        );
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = CommandError::InsufficientFunds {
            required: 50,
            required_gas: 0,
            available: 20,
            available_gas: 0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: need 50 minerals/0 gas, have 20/0"
        );
    }
}
