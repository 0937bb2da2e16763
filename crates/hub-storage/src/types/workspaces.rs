//! Workspace and member types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Rank, UserId, WorkspaceId};

pub const DEFAULT_WORKSPACE_NAME: &str = "My Entrepreneur Group";
pub const DEFAULT_PRIZE_TEXT: &str = "1st: $100 Amazon Gift Card\n2nd: $50 Starbucks Gift Card";
pub const DEFAULT_LEADER_NAME: &str = "Group Leader";
pub const DEFAULT_MEMBER_NAME: &str = "New Member";

/// Workspace record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    pub id: WorkspaceId,
    pub name: String,
    pub leader_id: UserId,
    #[serde(rename = "prizes", default)]
    pub prize_text: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Member record; `id` is the member's user id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default)]
    pub id: UserId,
    #[serde(default, deserialize_with = "super::lenient::string_or_number")]
    pub name: String,
    #[serde(default, deserialize_with = "super::lenient::string_or_number")]
    pub location: String,
    #[serde(default, deserialize_with = "super::lenient::string_or_number")]
    pub age: String,
    #[serde(
        rename = "businessModel",
        default,
        deserialize_with = "super::lenient::string_or_number"
    )]
    pub business_model_label: String,
    /// Self-reported revenue total, free text as entered on the profile.
    #[serde(
        rename = "revenue",
        default,
        deserialize_with = "super::lenient::string_or_number"
    )]
    pub revenue_total_self_reported: String,
    #[serde(default)]
    pub rank: Rank,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Fresh member record with an empty profile.
    pub fn new(id: UserId, name: &str, rank: Rank, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            location: String::new(),
            age: String::new(),
            business_model_label: String::new(),
            revenue_total_self_reported: "0".to_string(),
            rank,
            joined_at,
        }
    }
}

/// Parameters for creating a workspace together with its leader's member record.
#[derive(Clone, Debug)]
pub struct CreateWorkspaceParams {
    pub name: String,
    pub prize_text: String,
    /// Member record of the creator; its id becomes the workspace's `leaderId`.
    pub leader: Member,
}
