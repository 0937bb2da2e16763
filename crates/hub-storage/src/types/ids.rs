//! Strongly-typed identifiers (avoid mixing strings arbitrarily).
//!
//! All identifiers are opaque strings: the document store assigns workspace and
//! record ids, the identity provider assigns user ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workspace identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub String);

/// User identifier. Also the id of the user's member record in every workspace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Identifier of a record inside one of a workspace's collections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            /// Generate a fresh time-ordered identifier (UUID v7).
            pub fn generate() -> Self {
                Self(Uuid::now_v7().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(WorkspaceId);
string_id!(UserId);
string_id!(RecordId);

impl WorkspaceId {
    /// Parse a user-typed workspace id. Surrounding whitespace is ignored;
    /// blank input yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}
