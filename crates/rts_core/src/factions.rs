//! Faction definitions and identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionId {
    /// The human-controlled side.
    Player,
    /// The scripted side.
    Opponent,
}

impl FactionId {
    /// Both factions, in ledger order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Opponent];

    /// The other side.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }

    /// Stable slot used for per-faction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Opponent => 1,
        }
    }

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Opponent => "Opponent",
        }
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_is_involution() {
        for faction in FactionId::ALL {
            assert_ne!(faction, faction.enemy());
            assert_eq!(faction, faction.enemy().enemy());
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&FactionId::Opponent).unwrap(),
            "\"opponent\""
        );
    }
}
