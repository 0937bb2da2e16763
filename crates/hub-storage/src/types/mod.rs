//! Type definitions for hub storage.

use chrono::{DateTime, Utc};

mod documents;
mod ids;
mod lenient;
mod ranks;
mod records;
mod workspaces;

// Re-export all types from submodules
pub use documents::*;
pub use ids::*;
pub use ranks::*;
pub use records::*;
pub use workspaces::*;

/// Serde default for timestamps missing from a stored document.
pub(crate) fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
