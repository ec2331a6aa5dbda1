//! Minting of opaque codes and token pairs.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::config::GrantConfig;
use super::crypto::generate_secret;
use super::error::{OAuthError, Result};
use super::oauth_provider::{AccessTokenStore, CodeStore, RefreshTokenStore};
use super::types::{AccessToken, AuthorizationCode, Lineage, LineageParent, RefreshToken, TokenHash, TokenResponse};

/// A freshly minted secret. The plaintext is handed out once and never stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub id: Uuid,
    pub token: String,
    pub hash: TokenHash,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh token minted together.
#[derive(Debug, Clone)]
pub struct IssuedPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
    pub issued_at: DateTime<Utc>,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

impl IssuedPair {
    pub fn into_response(self) -> TokenResponse {
        TokenResponse::bearer(self.access.token, self.expires_in, self.refresh.token)
    }
}

/// Binding shared by both halves of a pair.
#[derive(Debug, Clone)]
pub struct PairGrant<'a> {
    pub client_id: &'a str,
    pub user_id: &'a str,
    pub scope: &'a str,
    pub parent: LineageParent,
}

/// `from + ttl`, or `ServerError` when the lifetime runs past what a timestamp can hold.
fn expiry(from: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    from.checked_add_signed(ttl).ok_or_else(|| {
        warn!(ttl_secs = ttl.num_seconds(), "configured lifetime overflows the expiry timestamp");
        OAuthError::ServerError
    })
}

#[derive(Clone)]
pub struct TokenIssuer {
    codes: Arc<dyn CodeStore>,
    access_tokens: Arc<dyn AccessTokenStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    config: GrantConfig,
}

impl TokenIssuer {
    pub fn new(
        codes: Arc<dyn CodeStore>,
        access_tokens: Arc<dyn AccessTokenStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        config: GrantConfig,
    ) -> Self {
        TokenIssuer { codes, access_tokens, refresh_tokens, config }
    }

    fn mint(&self) -> Result<(String, TokenHash)> {
        let secret = generate_secret(self.config.secret_bytes)?;
        let hash = TokenHash::of(&secret);
        Ok((secret, hash))
    }

    /// Mints an access/refresh pair that point at `grant.parent` and at each other.
    #[instrument(skip(self, grant), fields(client_id = grant.client_id), level = "debug")]
    pub async fn issue_pair(&self, grant: PairGrant<'_>) -> Result<IssuedPair> {
        let issued_at = Utc::now();
        let access_expires_at = expiry(issued_at, self.config.access_token_ttl)?;
        let refresh_expires_at = expiry(issued_at, self.config.refresh_token_ttl)?;
        let (access_secret, access_hash) = self.mint()?;
        let (refresh_secret, refresh_hash) = self.mint()?;

        let access = AccessToken {
            id: Uuid::new_v4(),
            hash: access_hash.clone(),
            client_id: grant.client_id.to_string(),
            user_id: grant.user_id.to_string(),
            scope: grant.scope.to_string(),
            issued_at,
            expires_at: access_expires_at,
            lineage: Lineage { parent: Some(grant.parent.clone()), sibling: Some(refresh_hash.clone()) },
        };
        let refresh = RefreshToken {
            id: Uuid::new_v4(),
            hash: refresh_hash.clone(),
            client_id: grant.client_id.to_string(),
            user_id: grant.user_id.to_string(),
            scope: grant.scope.to_string(),
            issued_at,
            expires_at: refresh_expires_at,
            lineage: Lineage { parent: Some(grant.parent), sibling: Some(access_hash.clone()) },
        };

        let access_issued = IssuedToken { id: access.id, token: access_secret, hash: access_hash, expires_at: access.expires_at };
        let refresh_issued = IssuedToken { id: refresh.id, token: refresh_secret, hash: refresh_hash, expires_at: refresh.expires_at };

        self.access_tokens.put(access).await?;
        self.refresh_tokens.put(refresh).await?;

        info!(
            access_id = %access_issued.id,
            refresh_id = %refresh_issued.id,
            scope = grant.scope,
            "issued token pair"
        );
        Ok(IssuedPair {
            access: access_issued,
            refresh: refresh_issued,
            issued_at,
            expires_in: self.config.access_token_ttl.num_seconds().max(0) as u64,
        })
    }

    /// Mints an authorization code after the user has consented.
    #[instrument(skip(self, redirect_uri, scope), level = "debug")]
    pub async fn issue_code(&self, client_id: &str, user_id: &str, redirect_uri: &str, scope: &str) -> Result<String> {
        let expires_at = expiry(Utc::now(), self.config.authorization_code_ttl)?;
        let (secret, hash) = self.mint()?;
        let code = AuthorizationCode {
            hash,
            client_id: client_id.to_string(),
            user_id: user_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: scope.to_string(),
            expires_at,
        };
        self.codes.put(code).await?;
        Ok(secret)
    }
}
