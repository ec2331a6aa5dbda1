//! Cascading revocation when a consumed code or refresh token comes back.

use std::fmt;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::oauth_provider::{AccessTokenStore, IncidentLogger, RefreshTokenStore};
use super::types::TokenHash;

/// Which kind of credential was replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayedCredential {
    AuthorizationCode,
    RefreshToken,
}

impl fmt::Display for ReplayedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayedCredential::AuthorizationCode => f.write_str("Authorization code"),
            ReplayedCredential::RefreshToken => f.write_str("Refresh token"),
        }
    }
}

/// Identifiers of the tokens removed by a cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokedTokens {
    pub access: Vec<Uuid>,
    pub refresh: Vec<Uuid>,
}

impl RevokedTokens {
    pub fn is_empty(&self) -> bool {
        self.access.is_empty() && self.refresh.is_empty()
    }
}

#[derive(Clone)]
pub struct ReplayGuard {
    access_tokens: Arc<dyn AccessTokenStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    incidents: Arc<dyn IncidentLogger>,
}

impl ReplayGuard {
    pub fn new(
        access_tokens: Arc<dyn AccessTokenStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        incidents: Arc<dyn IncidentLogger>,
    ) -> Self {
        ReplayGuard { access_tokens, refresh_tokens, incidents }
    }

    /// Revokes every token minted directly from `presented` and records the incident.
    ///
    /// Only direct children are searched: each redemption deletes its parent, so a
    /// replayed credential can only have live children one level down.
    /// Store failures are logged and skipped; the caller fails the request regardless.
    pub async fn revoke_descendants(&self, kind: ReplayedCredential, presented: &str) -> RevokedTokens {
        let parent = TokenHash::of(presented);
        let mut revoked = RevokedTokens::default();

        match self.access_tokens.find_by_lineage(&parent).await {
            Ok(children) => {
                for child in children {
                    match self.access_tokens.delete(&child.hash).await {
                        Ok(true) => revoked.access.push(child.id),
                        Ok(false) => {}
                        Err(err) => warn!(token_id = %child.id, error = %err, "failed to revoke access token"),
                    }
                }
            }
            Err(err) => warn!(parent = %parent, error = %err, "access token lineage lookup failed"),
        }

        match self.refresh_tokens.find_by_lineage(&parent).await {
            Ok(children) => {
                for child in children {
                    match self.refresh_tokens.delete(&child.hash).await {
                        Ok(true) => revoked.refresh.push(child.id),
                        Ok(false) => {}
                        Err(err) => warn!(token_id = %child.id, error = %err, "failed to revoke refresh token"),
                    }
                }
            }
            Err(err) => warn!(parent = %parent, error = %err, "refresh token lineage lookup failed"),
        }

        warn!(
            credential = %kind,
            parent = %parent,
            revoked_access = revoked.access.len(),
            revoked_refresh = revoked.refresh.len(),
            "credential not found, possible replay"
        );
        self.incidents.log(&format!(
            "{kind} not found. Possibly a replay. Value: {presented} Revoked access tokens: {:?} Revoked refresh tokens: {:?}",
            revoked.access, revoked.refresh
        ));
        revoked
    }
}
