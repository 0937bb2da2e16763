//! Capability checks derived from the caller's rank.
//!
//! These checks are advisory: they decide what the client offers and sends,
//! the store is still expected to authorize writes itself.

use std::str::FromStr;

use hub_storage::{Member, Rank, UserId};

/// A gated command class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    SendAnnouncement,
    CreateTrip,
    ManageRanks,
    EditWorkspace,
}

/// Error type for parsing Capability from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCapabilityError(pub String);

impl std::fmt::Display for ParseCapabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown capability: {}", self.0)
    }
}

impl std::error::Error for ParseCapabilityError {}

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older clients prefix names with CAN_.
        match s.strip_prefix("CAN_").unwrap_or(s) {
            "SEND_ANNOUNCEMENT" => Ok(Capability::SendAnnouncement),
            "CREATE_TRIP" => Ok(Capability::CreateTrip),
            "MANAGE_RANKS" => Ok(Capability::ManageRanks),
            "EDIT_WORKSPACE" => Ok(Capability::EditWorkspace),
            _ => Err(ParseCapabilityError(s.to_string())),
        }
    }
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::SendAnnouncement => "SEND_ANNOUNCEMENT",
            Capability::CreateTrip => "CREATE_TRIP",
            Capability::ManageRanks => "MANAGE_RANKS",
            Capability::EditWorkspace => "EDIT_WORKSPACE",
        }
    }

    /// Non-leader ranks granted this capability. The leader holds every
    /// capability and is not listed.
    pub fn allowed_ranks(&self) -> &'static [Rank] {
        match self {
            Capability::SendAnnouncement => &[Rank::Motivator, Rank::Planner],
            Capability::CreateTrip => &[Rank::Planner],
            Capability::ManageRanks | Capability::EditWorkspace => &[],
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `member` is the workspace leader, by rank or by the
/// workspace's `leaderId`.
pub fn is_leader(member: &Member, leader_id: Option<&UserId>) -> bool {
    member.rank == Rank::Leader || leader_id == Some(&member.id)
}

/// Decide whether the caller may perform a command class.
///
/// `member` is the caller's resolved member record; without one nothing is
/// allowed.
pub fn has_permission(
    capability: Capability,
    member: Option<&Member>,
    leader_id: Option<&UserId>,
) -> bool {
    let Some(member) = member else {
        return false;
    };
    if is_leader(member, leader_id) {
        return true;
    }
    capability.allowed_ranks().contains(&member.rank)
}

/// String-keyed variant; unknown capability names are never granted.
pub fn has_permission_named(
    capability: &str,
    member: Option<&Member>,
    leader_id: Option<&UserId>,
) -> bool {
    capability
        .parse::<Capability>()
        .map(|c| has_permission(c, member, leader_id))
        .unwrap_or(false)
}
