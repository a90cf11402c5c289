//! Authentication service resolving API tokens to request principals.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::Principal;
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Hashes a raw token with HMAC-SHA256 keyed by `signing_secret`.
///
/// Returns a 64-character lowercase hex-encoded MAC. The admin CLI uses the same
/// function when issuing tokens, so both sides must share the secret.
pub fn hash_token(signing_secret: &str, token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Service for authenticating API requests via Bearer tokens.
///
/// An attacker with read-only access to the database cannot verify or forge
/// tokens without the server-side secret.
pub struct AuthService {
    repository: Arc<dyn TokenRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    pub fn new(repository: Arc<dyn TokenRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    pub fn hash_token(&self, token: &str) -> String {
        hash_token(&self.signing_secret, token)
    }

    /// Resolves a raw token to the principal of its owner.
    ///
    /// On success the token's `last_used_at` is refreshed; a failure to do so is
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is unknown or revoked.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let token_hash = self.hash_token(token);

        let user = self
            .repository
            .find_user_by_token(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid or revoked token"}),
                )
            })?;

        if let Err(e) = self.repository.update_last_used(&token_hash).await {
            tracing::warn!(error = %e, user_id = user.id, "Failed to update token last_used_at");
        }

        Ok(Principal::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;
    use crate::domain::repositories::MockTokenRepository;
    use chrono::Utc;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    fn user(id: i64, premium: bool) -> User {
        User {
            id,
            name: "tester".to_string(),
            premium,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut mock_repo = MockTokenRepository::new();

        let token = "valid-token";
        let expected_hash = hash_token(&test_secret(), token);

        mock_repo
            .expect_find_user_by_token()
            .withf(move |hash| hash == expected_hash)
            .times(1)
            .returning(|_| Ok(Some(user(42, true))));

        mock_repo
            .expect_update_last_used()
            .times(1)
            .returning(|_| Ok(()));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let principal = service.authenticate(token).await.unwrap();

        assert_eq!(principal, Principal::user(42, true));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_user_by_token()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_update_last_used().times(0);

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let result = service.authenticate("invalid-token").await;

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_ignores_last_used_failure() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_user_by_token()
            .returning(|_| Ok(Some(user(7, false))));
        mock_repo
            .expect_update_last_used()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let principal = service.authenticate("token").await.unwrap();
        assert_eq!(principal.owner_id, 7);
        assert!(!principal.premium);
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token(&test_secret(), "test-token");
        let hash2 = hash_token(&test_secret(), "test-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token(&test_secret(), "other-token"));
    }

    #[test]
    fn test_hash_token_secret_matters() {
        assert_ne!(hash_token("secret-a", "token"), hash_token("secret-b", "token"));
    }
}
