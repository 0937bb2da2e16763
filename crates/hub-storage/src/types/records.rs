//! Record types of the workspace sub-collections.
//!
//! Every field a record might be missing has a default so a partially written
//! document still decodes. Cross-collection references (`Win::user_id`,
//! `Trip::qualifying_goal_ids`) are not checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordId, UserId};

/// Goal record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Trip record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub qualifying_goal_ids: Vec<RecordId>,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Kind of a motivation-board message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Standard,
    Announcement,
}

/// Motivation message or announcement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Meeting record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(default)]
    pub id: RecordId,
    pub topic: String,
    #[serde(default)]
    pub agenda: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Win record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Win {
    #[serde(default)]
    pub id: RecordId,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "super::lenient::number_or_string")]
    pub revenue_amount: f64,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Chat message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: RecordId,
    pub text: String,
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "super::unix_epoch")]
    pub created_at: DateTime<Utc>,
}
