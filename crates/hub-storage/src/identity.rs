//! Anonymous identity issuance.

use thiserror::Error;

use crate::UserId;

/// Error type for identity providers
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

/// Hands out a stable opaque user id for the running client.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity already established for this client, if any.
    async fn current_user(&self) -> Option<UserId>;

    /// Establish a new anonymous identity.
    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError>;
}
