//! Token endpoint request body.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use super::error::{OAuthError, Result};

/// Parameters of a token endpoint request. Missing fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenRequest {
    /// Decode an `application/x-www-form-urlencoded` body. Unknown keys are ignored
    /// and the last occurrence of a repeated key wins.
    pub fn from_form(body: &str) -> Self {
        let mut request = TokenRequest::default();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            let value = Some(decode_component(value));
            match key.as_str() {
                "grant_type" => request.grant_type = value,
                "client_id" => request.client_id = value,
                "client_secret" => request.client_secret = value,
                "code" => request.code = value,
                "redirect_uri" => request.redirect_uri = value,
                "refresh_token" => request.refresh_token = value,
                "scope" => request.scope = value,
                _ => {}
            }
        }
        request
    }

    /// Decode a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|_| OAuthError::InvalidRequest)
    }

    pub fn grant_type(&self) -> &str {
        self.grant_type.as_deref().unwrap_or_default()
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or_default()
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or_default()
    }

    pub fn refresh_token(&self) -> &str {
        self.refresh_token.as_deref().unwrap_or_default()
    }

    /// Requested scope; blank counts as not requested.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref().filter(|s| !s.trim().is_empty())
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// A token request together with the transport facts the dispatcher checks.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub params: TokenRequest,
    /// Whether the request arrived over TLS.
    pub secure: bool,
}

impl GrantRequest {
    pub fn secure(params: TokenRequest) -> Self {
        GrantRequest { params, secure: true }
    }

    pub fn insecure(params: TokenRequest) -> Self {
        GrantRequest { params, secure: false }
    }
}
