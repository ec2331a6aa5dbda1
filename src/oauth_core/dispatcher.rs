//! Token endpoint entry point: request checks, client authentication, grant routing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, instrument};

use super::authorization_code::AuthorizationCodeExchanger;
use super::bearer::BearerValidator;
use super::config::{AUTHORIZATION_CODE, GrantConfig, REFRESH_TOKEN};
use super::error::{OAuthError, Result};
use super::issuer::TokenIssuer;
use super::memory::{InMemoryAccessTokenStore, InMemoryCodeStore, InMemoryRefreshTokenStore, TracingIncidentLogger};
use super::oauth_provider::{AccessTokenStore, ClientAuthenticator, CodeStore, IncidentLogger, RefreshTokenStore};
use super::refresh_token::RefreshTokenRotator;
use super::replay::ReplayGuard;
use super::request::{GrantRequest, TokenRequest};
use super::scope::{DelimitedScopes, ScopeValidator};
use super::types::{JsonResponse, TokenResponse};

/// Grant types understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
    /// Anything else, routed through the extension map.
    Extension(String),
}

impl GrantType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            AUTHORIZATION_CODE => GrantType::AuthorizationCode,
            REFRESH_TOKEN => GrantType::RefreshToken,
            other => GrantType::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GrantType::AuthorizationCode => AUTHORIZATION_CODE,
            GrantType::RefreshToken => REFRESH_TOKEN,
            GrantType::Extension(name) => name,
        }
    }
}

/// Handler for a grant type registered outside the built-ins.
///
/// Called after the client has been authenticated. `Ok(None)` means the handler
/// produced no tokens.
#[async_trait]
pub trait GrantExtension: Send + Sync + 'static {
    async fn handle(&self, client_id: &str, request: &TokenRequest) -> Result<Option<TokenResponse>>;
}

/// Records dropped by [`GrantDispatcher::purge_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub codes: usize,
    pub access_tokens: usize,
    pub refresh_tokens: usize,
}

pub struct GrantDispatcher {
    config: GrantConfig,
    clients: Arc<dyn ClientAuthenticator>,
    codes: Arc<dyn CodeStore>,
    access_tokens: Arc<dyn AccessTokenStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    issuer: TokenIssuer,
    exchanger: AuthorizationCodeExchanger,
    rotator: RefreshTokenRotator,
    extensions: HashMap<String, Arc<dyn GrantExtension>>,
}

impl GrantDispatcher {
    /// Starts a builder with in-memory stores, space-delimited scopes and tracing incidents.
    pub fn builder(clients: Arc<dyn ClientAuthenticator>) -> GrantDispatcherBuilder {
        GrantDispatcherBuilder::new(clients)
    }

    pub fn config(&self) -> &GrantConfig {
        &self.config
    }

    /// Issuer sharing this dispatcher's stores, for the authorize flow.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Validator sharing this dispatcher's stores, for resource servers.
    pub fn bearer(&self) -> BearerValidator {
        BearerValidator::new(self.access_tokens.clone(), self.refresh_tokens.clone())
    }

    /// Runs a token request through every check and the matching grant handler.
    #[instrument(skip(self, request), fields(grant_type = request.params.grant_type()), level = "debug")]
    pub async fn handle(&self, request: &GrantRequest) -> Result<Option<TokenResponse>> {
        if !request.secure && !self.config.test_mode {
            return Err(OAuthError::InsecureTransport);
        }

        let params = &request.params;
        let (client_id, client_secret, grant_type) = (params.client_id(), params.client_secret(), params.grant_type());
        if client_id.is_empty() || client_secret.is_empty() || grant_type.is_empty() {
            debug!("missing client credentials or grant type");
            return Err(OAuthError::InvalidRequest);
        }

        // Deliberately not invalid_client: do not reveal which credential was wrong.
        if !self.clients.authenticate(client_id, client_secret).await? {
            debug!(client_id, "client authentication failed");
            return Err(OAuthError::InvalidRequest);
        }

        if !self.config.is_allowed(grant_type) {
            return Err(OAuthError::UnsupportedGrantType);
        }

        match GrantType::parse(grant_type) {
            GrantType::AuthorizationCode => self
                .exchanger
                .exchange(client_id, params.code(), params.redirect_uri())
                .await
                .map(Some),
            GrantType::RefreshToken => self
                .rotator
                .rotate(client_id, params.refresh_token(), params.scope())
                .await
                .map(Some),
            GrantType::Extension(name) => match self.extensions.get(&name) {
                Some(extension) => extension.handle(client_id, params).await,
                None => Ok(None),
            },
        }
    }

    /// [`handle`](Self::handle) mapped to a status and JSON body.
    pub async fn respond(&self, request: &GrantRequest) -> JsonResponse {
        match self.handle(request).await {
            Ok(Some(tokens)) => JsonResponse {
                status: 200,
                body: serde_json::to_value(tokens).unwrap_or(Value::Null),
            },
            Ok(None) => JsonResponse { status: 200, body: Value::Null },
            Err(err) => err.into_response(),
        }
    }

    /// Drops expired codes and tokens from every store.
    pub async fn purge_expired(&self) -> Result<PurgeReport> {
        let now = Utc::now();
        Ok(PurgeReport {
            codes: self.codes.purge_expired(now).await?,
            access_tokens: self.access_tokens.purge_expired(now).await?,
            refresh_tokens: self.refresh_tokens.purge_expired(now).await?,
        })
    }
}

/// Builder for [`GrantDispatcher`].
pub struct GrantDispatcherBuilder {
    config: GrantConfig,
    clients: Arc<dyn ClientAuthenticator>,
    codes: Arc<dyn CodeStore>,
    access_tokens: Arc<dyn AccessTokenStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    scopes: Arc<dyn ScopeValidator>,
    incidents: Arc<dyn IncidentLogger>,
    extensions: HashMap<String, Arc<dyn GrantExtension>>,
}

impl GrantDispatcherBuilder {
    pub fn new(clients: Arc<dyn ClientAuthenticator>) -> Self {
        GrantDispatcherBuilder {
            config: GrantConfig::new(),
            clients,
            codes: Arc::new(InMemoryCodeStore::new()),
            access_tokens: Arc::new(InMemoryAccessTokenStore::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenStore::new()),
            scopes: Arc::new(DelimitedScopes::default()),
            incidents: Arc::new(TracingIncidentLogger),
            extensions: HashMap::new(),
        }
    }

    pub fn config(mut self, config: GrantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn code_store(mut self, store: Arc<dyn CodeStore>) -> Self {
        self.codes = store;
        self
    }

    pub fn access_token_store(mut self, store: Arc<dyn AccessTokenStore>) -> Self {
        self.access_tokens = store;
        self
    }

    pub fn refresh_token_store(mut self, store: Arc<dyn RefreshTokenStore>) -> Self {
        self.refresh_tokens = store;
        self
    }

    pub fn scope_validator(mut self, scopes: Arc<dyn ScopeValidator>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn incident_logger(mut self, incidents: Arc<dyn IncidentLogger>) -> Self {
        self.incidents = incidents;
        self
    }

    /// Registers a handler for a custom grant type and adds it to the allow-list.
    pub fn extension(mut self, grant_type: impl Into<String>, handler: Arc<dyn GrantExtension>) -> Self {
        let grant_type = grant_type.into();
        self.config = self.config.allow_grant_type(grant_type.clone());
        self.extensions.insert(grant_type, handler);
        self
    }

    pub fn build(self) -> GrantDispatcher {
        let issuer = TokenIssuer::new(
            self.codes.clone(),
            self.access_tokens.clone(),
            self.refresh_tokens.clone(),
            self.config.clone(),
        );
        let replay = ReplayGuard::new(self.access_tokens.clone(), self.refresh_tokens.clone(), self.incidents);
        let exchanger = AuthorizationCodeExchanger::new(self.codes.clone(), issuer.clone(), replay.clone());
        let rotator = RefreshTokenRotator::new(self.refresh_tokens.clone(), self.scopes, issuer.clone(), replay);
        GrantDispatcher {
            config: self.config,
            clients: self.clients,
            codes: self.codes,
            access_tokens: self.access_tokens,
            refresh_tokens: self.refresh_tokens,
            issuer,
            exchanger,
            rotator,
            extensions: self.extensions,
        }
    }
}
