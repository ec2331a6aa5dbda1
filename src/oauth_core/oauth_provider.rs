//! Collaborator traits the grant handlers are built on.
//!
//! Every store is keyed by [`TokenHash`]; plaintext secrets never reach storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::Result;
use super::types::{AccessToken, AuthorizationCode, RefreshToken, TokenHash};

/// Checks client credentials against the external registry.
#[async_trait]
pub trait ClientAuthenticator: Send + Sync + 'static {
    /// `true` when the secret matches the registered client.
    async fn authenticate(&self, client_id: &str, client_secret: &str) -> Result<bool>;
}

/// Storage for authorization codes.
#[async_trait]
pub trait CodeStore: Send + Sync + 'static {
    /// Looks up a code by the hash of its presented value.
    async fn get(&self, hash: &TokenHash) -> Result<Option<AuthorizationCode>>;

    /// Stores a freshly minted code.
    async fn put(&self, code: AuthorizationCode) -> Result<()>;

    /// Atomically removes the code. Returns `false` if it was already gone.
    async fn delete(&self, hash: &TokenHash) -> Result<bool>;

    /// Removes codes expired at `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Storage for access tokens.
#[async_trait]
pub trait AccessTokenStore: Send + Sync + 'static {
    /// Looks up a token by the hash of its presented value.
    async fn get(&self, hash: &TokenHash) -> Result<Option<AccessToken>>;

    /// Stores a freshly issued token.
    async fn put(&self, token: AccessToken) -> Result<()>;

    /// Atomically removes the token. Returns `false` if it was already gone.
    async fn delete(&self, hash: &TokenHash) -> Result<bool>;

    /// Tokens whose parent lineage is the credential with `parent` hash.
    async fn find_by_lineage(&self, parent: &TokenHash) -> Result<Vec<AccessToken>>;

    /// Removes tokens expired at `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Storage for refresh tokens.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Looks up a token by the hash of its presented value.
    async fn get(&self, hash: &TokenHash) -> Result<Option<RefreshToken>>;

    /// Stores a freshly issued token.
    async fn put(&self, token: RefreshToken) -> Result<()>;

    /// Atomically removes the token. Returns `false` if it was already gone.
    async fn delete(&self, hash: &TokenHash) -> Result<bool>;

    /// Tokens whose parent lineage is the credential with `parent` hash.
    async fn find_by_lineage(&self, parent: &TokenHash) -> Result<Vec<RefreshToken>>;

    /// Removes tokens expired at `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Sink for security incidents such as replayed credentials.
pub trait IncidentLogger: Send + Sync + 'static {
    /// Records one incident line.
    fn log(&self, message: &str);
}
