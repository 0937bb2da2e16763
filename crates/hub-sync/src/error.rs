use hub_config::ConfigError;
use hub_storage::{AuthError, StoreError};
use thiserror::Error;

/// Errors surfaced by the sync engine.
///
/// Messages are kept generic and displayable; the underlying cause is logged
/// where the failure happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("workspace not found")]
    NotFound,
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),
    #[error("an error occurred, please try again ({0})")]
    OperationFailed(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SyncError::NotFound,
            other => SyncError::OperationFailed(other.to_string()),
        }
    }
}

impl From<AuthError> for SyncError {
    fn from(err: AuthError) -> Self {
        SyncError::AuthenticationFailure(err.to_string())
    }
}

impl From<ConfigError> for SyncError {
    fn from(err: ConfigError) -> Self {
        SyncError::OperationFailed(err.to_string())
    }
}
