#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use starberry_grant::oauth_core::types::{AuthorizationCode, Lineage, RefreshToken};
use starberry_grant::{
    Client, CodeStore, GrantConfig, GrantDispatcher, GrantRequest, InMemoryAccessTokenStore,
    InMemoryClientAuthenticator, InMemoryCodeStore, InMemoryRefreshTokenStore, MemoryIncidentLogger,
    RefreshTokenStore, TokenHash, TokenRequest,
};

pub const CLIENT_A: &str = "client-a";
pub const SECRET_A: &str = "secret-a";
pub const CLIENT_B: &str = "client-b";
pub const SECRET_B: &str = "secret-b";
pub const REDIRECT: &str = "https://app.local/callback";
pub const USER: &str = "user-1";

pub struct Harness {
    pub dispatcher: Arc<GrantDispatcher>,
    pub codes: InMemoryCodeStore,
    pub access: InMemoryAccessTokenStore,
    pub refresh: InMemoryRefreshTokenStore,
    pub incidents: MemoryIncidentLogger,
}

pub fn clients() -> InMemoryClientAuthenticator {
    InMemoryClientAuthenticator::new(vec![
        Client::new(CLIENT_A, SECRET_A, vec![REDIRECT.to_string()]),
        Client::new(CLIENT_B, SECRET_B, vec!["https://other.local/cb".to_string()]),
    ])
}

pub fn harness() -> Harness {
    harness_with(GrantConfig::new())
}

pub fn harness_with(config: GrantConfig) -> Harness {
    let codes = InMemoryCodeStore::new();
    let access = InMemoryAccessTokenStore::new();
    let refresh = InMemoryRefreshTokenStore::new();
    let incidents = MemoryIncidentLogger::new();
    let dispatcher = GrantDispatcher::builder(Arc::new(clients()))
        .config(config)
        .code_store(Arc::new(codes.clone()))
        .access_token_store(Arc::new(access.clone()))
        .refresh_token_store(Arc::new(refresh.clone()))
        .incident_logger(Arc::new(incidents.clone()))
        .build();
    Harness { dispatcher: Arc::new(dispatcher), codes, access, refresh, incidents }
}

pub fn code_request(client_id: &str, secret: &str, code: &str, redirect_uri: &str) -> GrantRequest {
    GrantRequest::secure(TokenRequest {
        grant_type: Some("authorization_code".into()),
        client_id: Some(client_id.into()),
        client_secret: Some(secret.into()),
        code: Some(code.into()),
        redirect_uri: Some(redirect_uri.into()),
        ..TokenRequest::default()
    })
}

pub fn refresh_request(client_id: &str, secret: &str, token: &str, scope: Option<&str>) -> GrantRequest {
    GrantRequest::secure(TokenRequest {
        grant_type: Some("refresh_token".into()),
        client_id: Some(client_id.into()),
        client_secret: Some(secret.into()),
        refresh_token: Some(token.into()),
        scope: scope.map(Into::into),
        ..TokenRequest::default()
    })
}

/// Stores a code directly, bypassing the issuer, so expiry can be chosen.
pub async fn seed_code(h: &Harness, secret: &str, client_id: &str, redirect_uri: &str, expires_at: DateTime<Utc>) {
    h.codes
        .put(AuthorizationCode {
            hash: TokenHash::of(secret),
            client_id: client_id.to_string(),
            user_id: USER.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: "read".to_string(),
            expires_at,
        })
        .await
        .unwrap();
}

/// Stores a refresh token directly with a known plaintext.
pub async fn seed_refresh(h: &Harness, secret: &str, client_id: &str, scope: &str, expires_at: DateTime<Utc>) {
    h.refresh
        .put(RefreshToken {
            id: Uuid::new_v4(),
            hash: TokenHash::of(secret),
            client_id: client_id.to_string(),
            user_id: USER.to_string(),
            scope: scope.to_string(),
            issued_at: Utc::now(),
            expires_at,
            lineage: Lineage::default(),
        })
        .await
        .unwrap();
}

pub fn in_a_year() -> DateTime<Utc> {
    Utc::now() + Duration::days(365)
}

pub fn an_hour_ago() -> DateTime<Utc> {
    Utc::now() - Duration::hours(1)
}
