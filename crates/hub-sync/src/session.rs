//! Session bootstrap: establishes the anonymous identity every other
//! component keys off.

use hub_storage::{IdentityProvider, UserId};
use tracing::{error, info};

use crate::SyncError;

/// The running client's identity. Not ready until [`Session::bootstrap`]
/// succeeds.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    /// A session with no identity yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Reuse the provider's existing identity or sign in anonymously.
    pub async fn bootstrap(provider: &dyn IdentityProvider) -> Result<Self, SyncError> {
        if let Some(user_id) = provider.current_user().await {
            info!("Resumed session for user {}", user_id);
            return Ok(Self {
                user_id: Some(user_id),
            });
        }

        let user_id = provider.sign_in_anonymously().await.map_err(|e| {
            error!("Anonymous sign-in failed: {}", e);
            SyncError::from(e)
        })?;
        info!("Signed in anonymously as {}", user_id);
        Ok(Self {
            user_id: Some(user_id),
        })
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_storage::{AuthError, MockIdentityProvider};

    #[tokio::test]
    async fn reuses_existing_identity() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_current_user()
            .returning(|| Some(UserId::from("u1")));
        provider.expect_sign_in_anonymously().never();

        let session = Session::bootstrap(&provider).await.unwrap();
        assert!(session.is_ready());
        assert_eq!(session.user_id(), Some(&UserId::from("u1")));
    }

    #[tokio::test]
    async fn signs_in_when_no_identity() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_user().returning(|| None);
        provider
            .expect_sign_in_anonymously()
            .times(1)
            .returning(|| Ok(UserId::from("fresh")));

        let session = Session::bootstrap(&provider).await.unwrap();
        assert_eq!(session.user_id(), Some(&UserId::from("fresh")));
    }

    #[tokio::test]
    async fn sign_in_failure_is_authentication_failure() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_current_user().returning(|| None);
        provider
            .expect_sign_in_anonymously()
            .returning(|| Err(AuthError::Unavailable("offline".to_string())));

        let err = Session::bootstrap(&provider).await.unwrap_err();
        assert!(matches!(err, SyncError::AuthenticationFailure(_)));
    }

    #[test]
    fn pending_session_is_not_ready() {
        let session = Session::pending();
        assert!(!session.is_ready());
        assert!(session.user_id().is_none());
    }
}
