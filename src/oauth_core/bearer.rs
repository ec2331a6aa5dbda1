//! Validation and explicit revocation of issued tokens.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::error::{OAuthError, Result};
use super::oauth_provider::{AccessTokenStore, RefreshTokenStore};
use super::types::{AccessToken, TokenHash};

/// Resolves presented bearer tokens to their records.
#[derive(Clone)]
pub struct BearerValidator {
    access_tokens: Arc<dyn AccessTokenStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl BearerValidator {
    pub fn new(access_tokens: Arc<dyn AccessTokenStore>, refresh_tokens: Arc<dyn RefreshTokenStore>) -> Self {
        BearerValidator { access_tokens, refresh_tokens }
    }

    /// Returns the live record for `token`. Expired records are dropped on sight.
    pub async fn validate(&self, token: &str) -> Result<AccessToken> {
        let hash = TokenHash::of(token);
        let record = self.access_tokens.get(&hash).await?.ok_or(OAuthError::InvalidToken)?;
        if record.is_expired(Utc::now()) {
            debug!(token_id = %record.id, "access token expired");
            self.access_tokens.delete(&hash).await?;
            return Err(OAuthError::InvalidToken);
        }
        Ok(record)
    }

    /// Revokes an access or refresh token by its plaintext. Returns whether anything was removed.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let hash = TokenHash::of(token);
        let access = self.access_tokens.delete(&hash).await?;
        let refresh = self.refresh_tokens.delete(&hash).await?;
        if access || refresh {
            info!(token_hash = %hash, "token revoked");
        }
        Ok(access || refresh)
    }
}
