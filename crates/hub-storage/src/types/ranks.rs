//! Member rank within a workspace.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rank of a member inside a workspace.
///
/// Exactly one member of a workspace holds `Leader`: the workspace creator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    Member,
    Motivator,
    Planner,
    Leader,
}

/// Error type for parsing Rank from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRankError(pub String);

impl std::fmt::Display for ParseRankError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid rank: {}", self.0)
    }
}

impl std::error::Error for ParseRankError {}

impl FromStr for Rank {
    type Err = ParseRankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Member" => Ok(Rank::Member),
            "Motivator" => Ok(Rank::Motivator),
            "Planner" => Ok(Rank::Planner),
            "Leader" => Ok(Rank::Leader),
            _ => Err(ParseRankError(s.to_string())),
        }
    }
}

impl Rank {
    /// Ranks a leader may hand out. `Leader` is fixed at workspace creation.
    pub const ASSIGNABLE: [Rank; 3] = [Rank::Member, Rank::Motivator, Rank::Planner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Member => "Member",
            Rank::Motivator => "Motivator",
            Rank::Planner => "Planner",
            Rank::Leader => "Leader",
        }
    }

    pub fn is_assignable(&self) -> bool {
        !matches!(self, Rank::Leader)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
