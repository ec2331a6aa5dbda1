//! In-memory default implementations for the collaborator traits.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use super::crypto::constant_time_eq;
use super::error::Result;
use super::oauth_provider::{AccessTokenStore, ClientAuthenticator, CodeStore, IncidentLogger, RefreshTokenStore};
use super::types::{AccessToken, AuthorizationCode, Client, RefreshToken, TokenHash};

#[derive(Clone, Default)]
pub struct InMemoryClientAuthenticator {
    clients: Arc<DashMap<String, Client>>,
}

impl InMemoryClientAuthenticator {
    /// Creates a new in-memory client registry with an initial set of clients.
    pub fn new(initial_clients: Vec<Client>) -> Self {
        let map = DashMap::new();
        for client in initial_clients {
            map.insert(client.id.clone(), client);
        }
        Self { clients: Arc::new(map) }
    }

    pub fn register(&self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }
}

#[async_trait]
impl ClientAuthenticator for InMemoryClientAuthenticator {
    async fn authenticate(&self, client_id: &str, client_secret: &str) -> Result<bool> {
        let presented = TokenHash::of(client_secret);
        Ok(self
            .clients
            .get(client_id)
            .is_some_and(|c| constant_time_eq(c.secret_hash.as_str().as_bytes(), presented.as_str().as_bytes())))
    }
}

/// Drops every entry whose expiry has passed and reports how many went.
fn purge<V>(map: &DashMap<TokenHash, V>, expired: impl Fn(&V) -> bool) -> usize {
    let mut removed = 0;
    map.retain(|_, v| {
        if expired(&*v) {
            removed += 1;
            false
        } else {
            true
        }
    });
    removed
}

#[derive(Clone, Default)]
pub struct InMemoryCodeStore {
    codes: Arc<DashMap<TokenHash, AuthorizationCode>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn get(&self, hash: &TokenHash) -> Result<Option<AuthorizationCode>> {
        Ok(self.codes.get(hash).map(|entry| entry.value().clone()))
    }

    async fn put(&self, code: AuthorizationCode) -> Result<()> {
        self.codes.insert(code.hash.clone(), code);
        Ok(())
    }

    async fn delete(&self, hash: &TokenHash) -> Result<bool> {
        Ok(self.codes.remove(hash).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(purge(&self.codes, |c| c.is_expired(now)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAccessTokenStore {
    tokens: Arc<DashMap<TokenHash, AccessToken>>,
}

impl InMemoryAccessTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AccessTokenStore for InMemoryAccessTokenStore {
    async fn get(&self, hash: &TokenHash) -> Result<Option<AccessToken>> {
        Ok(self.tokens.get(hash).map(|entry| entry.value().clone()))
    }

    async fn put(&self, token: AccessToken) -> Result<()> {
        self.tokens.insert(token.hash.clone(), token);
        Ok(())
    }

    async fn delete(&self, hash: &TokenHash) -> Result<bool> {
        Ok(self.tokens.remove(hash).is_some())
    }

    async fn find_by_lineage(&self, parent: &TokenHash) -> Result<Vec<AccessToken>> {
        Ok(self
            .tokens
            .iter()
            .filter(|entry| entry.value().lineage.descends_from(parent))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(purge(&self.tokens, |t| t.is_expired(now)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Arc<DashMap<TokenHash, RefreshToken>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn get(&self, hash: &TokenHash) -> Result<Option<RefreshToken>> {
        Ok(self.tokens.get(hash).map(|entry| entry.value().clone()))
    }

    async fn put(&self, token: RefreshToken) -> Result<()> {
        self.tokens.insert(token.hash.clone(), token);
        Ok(())
    }

    async fn delete(&self, hash: &TokenHash) -> Result<bool> {
        Ok(self.tokens.remove(hash).is_some())
    }

    async fn find_by_lineage(&self, parent: &TokenHash) -> Result<Vec<RefreshToken>> {
        Ok(self
            .tokens
            .iter()
            .filter(|entry| entry.value().lineage.descends_from(parent))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(purge(&self.tokens, |t| t.is_expired(now)))
    }
}

/// Forwards incidents to the `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingIncidentLogger;

impl IncidentLogger for TracingIncidentLogger {
    fn log(&self, message: &str) {
        warn!(target: "starberry_grant::incident", "{}", message);
    }
}

/// Keeps incidents in memory so they can be inspected.
#[derive(Clone, Default)]
pub struct MemoryIncidentLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemoryIncidentLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl IncidentLogger for MemoryIncidentLogger {
    fn log(&self, message: &str) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(message.to_string());
    }
}
