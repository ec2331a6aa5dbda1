//! The `authorization_code` grant.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::error::{OAuthError, Result};
use super::issuer::{PairGrant, TokenIssuer};
use super::oauth_provider::CodeStore;
use super::replay::{ReplayGuard, ReplayedCredential};
use super::types::{LineageParent, TokenHash, TokenResponse};

/// Redeems authorization codes for token pairs.
#[derive(Clone)]
pub struct AuthorizationCodeExchanger {
    codes: Arc<dyn CodeStore>,
    issuer: TokenIssuer,
    replay: ReplayGuard,
}

impl AuthorizationCodeExchanger {
    pub fn new(codes: Arc<dyn CodeStore>, issuer: TokenIssuer, replay: ReplayGuard) -> Self {
        AuthorizationCodeExchanger { codes, issuer, replay }
    }

    /// Exchange `code` for a token pair on behalf of the authenticated `client_id`.
    #[instrument(skip(self, code, redirect_uri), level = "debug")]
    pub async fn exchange(&self, client_id: &str, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        if code.is_empty() || redirect_uri.is_empty() {
            return Err(OAuthError::InvalidRequest);
        }

        let hash = TokenHash::of(code);
        let Some(stored) = self.codes.get(&hash).await? else {
            self.replay.revoke_descendants(ReplayedCredential::AuthorizationCode, code).await;
            return Err(OAuthError::InvalidRequest);
        };

        // An empty stored redirect URI never matches.
        if stored.redirect_uri.is_empty() || stored.redirect_uri != redirect_uri {
            debug!("redirect uri mismatch");
            return Err(OAuthError::InvalidRequest);
        }
        if stored.client_id != client_id {
            debug!(code_client = %stored.client_id, "code issued to another client");
            return Err(OAuthError::InvalidRequest);
        }
        if stored.is_expired(Utc::now()) {
            debug!(expired_at = %stored.expires_at, "authorization code expired");
            return Err(OAuthError::InvalidRequest);
        }

        if !self.codes.delete(&hash).await? {
            warn!(code_hash = %hash, "authorization code consumed concurrently");
            return Err(OAuthError::ServerError);
        }

        let pair = self
            .issuer
            .issue_pair(PairGrant {
                client_id: &stored.client_id,
                user_id: &stored.user_id,
                scope: &stored.scope,
                parent: LineageParent::AuthorizationCode(hash),
            })
            .await?;
        Ok(pair.into_response())
    }
}
