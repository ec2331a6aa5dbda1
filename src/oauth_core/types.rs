//! OAuth2 core records: clients, codes, tokens and their lineage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::hash_secret;

/// Represents an OAuth 2.0 client application as held by the external registry.
#[derive(Debug, Clone)]
pub struct Client {
    /// Client identifier.
    pub id: String,
    /// Hash of the client secret, never the plaintext.
    pub secret_hash: TokenHash,
    /// Allowed redirect URIs.
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Build a client from a plaintext secret, hashing it on the way in.
    pub fn new(id: impl Into<String>, secret: &str, redirect_uris: Vec<String>) -> Self {
        Client { id: id.into(), secret_hash: TokenHash::of(secret), redirect_uris }
    }
}

/// Stable hash of an opaque secret. Records are indexed by it and lineage points at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenHash(String);

impl TokenHash {
    /// Hash a presented secret.
    pub fn of(secret: &str) -> Self {
        TokenHash(hash_secret(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The credential a token was minted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageParent {
    AuthorizationCode(TokenHash),
    RefreshToken(TokenHash),
}

impl LineageParent {
    pub fn hash(&self) -> &TokenHash {
        match self {
            LineageParent::AuthorizationCode(hash) | LineageParent::RefreshToken(hash) => hash,
        }
    }
}

/// Backward link to the parent credential and sideways link to the co-issued token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub parent: Option<LineageParent>,
    pub sibling: Option<TokenHash>,
}

impl Lineage {
    /// Whether this lineage was spawned by the credential with the given hash.
    pub fn descends_from(&self, hash: &TokenHash) -> bool {
        self.parent.as_ref().is_some_and(|p| p.hash() == hash)
    }
}

/// Single-use authorization code produced by the authorize flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub hash: TokenHash,
    pub client_id: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Bearer credential for API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: Uuid,
    pub hash: TokenHash,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub lineage: Lineage,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Long-lived credential rotated into a fresh pair on every use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub hash: TokenHash,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub lineage: Lineage,
}

impl RefreshToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub token_type: String,
    pub refresh_token: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: u64, refresh_token: String) -> Self {
        TokenResponse { access_token, expires_in, token_type: "Bearer".to_string(), refresh_token }
    }
}

/// Transport-agnostic JSON response: status plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl JsonResponse {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.body).unwrap_or_default()
    }
}
