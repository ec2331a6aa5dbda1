//! The `refresh_token` grant with rotation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::error::{OAuthError, Result};
use super::issuer::{PairGrant, TokenIssuer};
use super::oauth_provider::RefreshTokenStore;
use super::replay::{ReplayGuard, ReplayedCredential};
use super::scope::ScopeValidator;
use super::types::{LineageParent, TokenHash, TokenResponse};

/// Rotates refresh tokens into fresh pairs, never widening scope.
#[derive(Clone)]
pub struct RefreshTokenRotator {
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    scopes: Arc<dyn ScopeValidator>,
    issuer: TokenIssuer,
    replay: ReplayGuard,
}

impl RefreshTokenRotator {
    pub fn new(
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        scopes: Arc<dyn ScopeValidator>,
        issuer: TokenIssuer,
        replay: ReplayGuard,
    ) -> Self {
        RefreshTokenRotator { refresh_tokens, scopes, issuer, replay }
    }

    /// Consume `refresh_token` and issue a new pair for `client_id`, optionally narrowed to `scope`.
    #[instrument(skip(self, refresh_token, scope), level = "debug")]
    pub async fn rotate(&self, client_id: &str, refresh_token: &str, scope: Option<&str>) -> Result<TokenResponse> {
        let hash = TokenHash::of(refresh_token);
        let Some(stored) = self.refresh_tokens.get(&hash).await? else {
            self.replay.revoke_descendants(ReplayedCredential::RefreshToken, refresh_token).await;
            return Err(OAuthError::InvalidGrant);
        };

        if stored.client_id != client_id {
            debug!(token_client = %stored.client_id, "refresh token issued to another client");
            return Err(OAuthError::InvalidRequest);
        }
        if stored.is_expired(Utc::now()) {
            debug!(token_id = %stored.id, expired_at = %stored.expires_at, "refresh token expired");
            return Err(OAuthError::InvalidGrant);
        }

        let resolved = self.scopes.narrow(&stored.scope, scope).inspect_err(|_| {
            debug!(token_id = %stored.id, held = %stored.scope, requested = ?scope, "scope widening rejected");
        })?;

        if !self.refresh_tokens.delete(&hash).await? {
            warn!(token_id = %stored.id, "refresh token consumed concurrently");
            return Err(OAuthError::ServerError);
        }

        let pair = self
            .issuer
            .issue_pair(PairGrant {
                client_id: &stored.client_id,
                user_id: &stored.user_id,
                scope: &resolved,
                parent: LineageParent::RefreshToken(hash),
            })
            .await?;
        Ok(pair.into_response())
    }
}
