//! Raw documents, collections and change batches.
//!
//! Records reach the client as loosely-shaped JSON documents. Typed views
//! (`Goal`, `Win`, ...) are decoded on demand; notification probing and
//! client-side ordering work directly on the raw fields.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{RecordId, WorkspaceId};

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Field every record carries for its creation time (epoch milliseconds).
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A stored document: its id plus its fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: RecordId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Return the named field when it holds a non-empty string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Creation time in epoch milliseconds; absent or malformed reads as 0.
    pub fn created_at_millis(&self) -> i64 {
        self.fields
            .get(CREATED_AT_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Decode into a typed record. The document id is exposed as `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.0.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Serialize a typed record into a field map, dropping any `id` field
/// (ids are assigned by the store).
pub fn encode_fields<T: Serialize>(record: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Sub-collections of a workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Members,
    Goals,
    Trips,
    Messages,
    Meetings,
    Wins,
    Chat,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Members,
        Collection::Goals,
        Collection::Trips,
        Collection::Messages,
        Collection::Meetings,
        Collection::Wins,
        Collection::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Members => "members",
            Collection::Goals => "goals",
            Collection::Trips => "trips",
            Collection::Messages => "messages",
            Collection::Meetings => "meetings",
            Collection::Wins => "wins",
            Collection::Chat => "chat",
        }
    }

    /// Path of this collection under a workspace: `workspaces/{id}/{collection}`.
    pub fn path(&self, workspace_id: &WorkspaceId) -> String {
        format!("{}/{}", workspace_path(workspace_id), self.as_str())
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of the workspace document: `workspaces/{id}`.
pub fn workspace_path(workspace_id: &WorkspaceId) -> String {
    format!("workspaces/{}", workspace_id)
}

/// Ordering a subscription asks the store to apply at the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceOrder {
    Unordered,
    CreatedAtAscending,
}

/// Classification of one document change inside a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocChange {
    pub kind: ChangeKind,
    pub doc: Document,
}

/// One delivery from a subscription: the full current set plus the
/// per-document changes since the previous delivery.
///
/// The first batch of a subscription reports every document as `Added`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeBatch {
    pub docs: Vec<Document>,
    pub changes: Vec<DocChange>,
}

impl ChangeBatch {
    pub fn added(&self) -> impl Iterator<Item = &Document> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Added)
            .map(|c| &c.doc)
    }
}
