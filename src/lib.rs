//! OAuth2 token endpoint core: authorization code exchange, refresh token
//! rotation and cascading revocation on replay.

pub mod oauth_core;

pub use oauth_core::bearer::BearerValidator;
pub use oauth_core::config::GrantConfig;
pub use oauth_core::dispatcher::{GrantDispatcher, GrantDispatcherBuilder, GrantExtension, GrantType, PurgeReport};
pub use oauth_core::error::OAuthError;
pub use oauth_core::issuer::TokenIssuer;
pub use oauth_core::memory::{
    InMemoryAccessTokenStore, InMemoryClientAuthenticator, InMemoryCodeStore, InMemoryRefreshTokenStore,
    MemoryIncidentLogger, TracingIncidentLogger,
};
pub use oauth_core::oauth_provider::{AccessTokenStore, ClientAuthenticator, CodeStore, IncidentLogger, RefreshTokenStore};
pub use oauth_core::request::{GrantRequest, TokenRequest};
pub use oauth_core::scope::{DelimitedScopes, MappedScopes, ScopeValidator};
pub use oauth_core::types::{Client, JsonResponse, TokenHash, TokenResponse};
