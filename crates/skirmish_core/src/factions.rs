//! Faction identifiers.

use serde::{Deserialize, Serialize};

/// One of the two sides in a skirmish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The human-controlled side.
    Player,
    /// The computer-controlled side driven by the opponent planner.
    Opponent,
}

impl Faction {
    /// Both factions in a fixed order.
    pub const ALL: [Faction; 2] = [Faction::Player, Faction::Opponent];

    /// The opposing faction.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }

    /// Stable index for per-faction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Opponent => 1,
        }
    }

    /// Short name used in logs and reports.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Opponent => "opponent",
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_is_involution() {
        for faction in Faction::ALL {
            assert_eq!(faction.enemy().enemy(), faction);
            assert_ne!(faction.enemy(), faction);
        }
    }

    #[test]
    fn test_indices_are_distinct() {
        assert_eq!(Faction::Player.index(), 0);
        assert_eq!(Faction::Opponent.index(), 1);
    }
}
