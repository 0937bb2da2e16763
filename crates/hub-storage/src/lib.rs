//! Storage abstraction for Hustle Hub.
//!
//! Backend crates (e.g., hub-store-memory) implement [`DocumentStore`] so the
//! sync core doesn't depend on any specific real-time database.

use std::pin::Pin;

use futures::Stream;
use thiserror::Error;

mod identity;
mod store;
mod types;

pub use identity::*;
pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Backend(format!("malformed document: {}", e))
    }
}

/// Stream of batches delivered by a collection subscription.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeBatch> + Send>>;

/// Stream of workspace document values (`None` once it is gone).
pub type WorkspaceStream = Pin<Box<dyn Stream<Item = Option<Workspace>> + Send>>;
