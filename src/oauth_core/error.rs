//! Token endpoint error kinds and their wire representation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::types::JsonResponse;

/// Every way a grant request can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OAuthError {
    /// Plain-text request while test mode is off.
    InsecureTransport,
    /// Missing or malformed fields, client mismatch, bad redirect URI,
    /// expired authorization code or failed client authentication.
    InvalidRequest,
    /// Refresh token unknown (already consumed) or expired.
    InvalidGrant,
    /// Requested scope is wider than the held scope.
    InvalidScope,
    /// Grant type outside the allow-list.
    UnsupportedGrantType,
    /// Presented bearer token is unknown or expired.
    InvalidToken,
    /// Single-use record vanished between lookup and deletion, or a store fault.
    ServerError,
}

impl OAuthError {
    /// OAuth2 error code sent in the `error` field.
    pub fn error_code(&self) -> &'static str {
        match self {
            OAuthError::InsecureTransport => "invalid_request",
            OAuthError::InvalidRequest => "invalid_request",
            OAuthError::InvalidGrant => "invalid_grant",
            OAuthError::InvalidScope => "invalid_scope",
            OAuthError::UnsupportedGrantType => "unsupported_grant_type",
            OAuthError::InvalidToken => "invalid_token",
            OAuthError::ServerError => "server_error",
        }
    }

    /// Human readable description sent in `error_description`.
    pub fn description(&self) -> &'static str {
        match self {
            OAuthError::InsecureTransport => "TLS is required",
            OAuthError::InvalidRequest => "The request is missing a parameter or is otherwise malformed",
            OAuthError::InvalidGrant => "Invalid grant provided",
            OAuthError::InvalidScope => "The requested scope exceeds the granted scope",
            OAuthError::UnsupportedGrantType => "The grant type is not supported",
            OAuthError::InvalidToken => "The token is invalid",
            OAuthError::ServerError => "Internal server error",
        }
    }

    /// HTTP status a transport binding should use.
    pub fn status_code(&self) -> u16 {
        match self {
            OAuthError::InvalidToken => 401,
            OAuthError::ServerError => 500,
            _ => 400,
        }
    }

    /// Convert this error into a JSON response body with its status.
    pub fn into_response(self) -> JsonResponse {
        let code = self.error_code();
        let status = self.status_code();
        warn!(error = ?self, error_code = code, http_status = status, "OAuth error occurred");
        let body = json!({ "error": code, "error_description": self.description() });
        JsonResponse { status, body }
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.description())
    }
}

impl std::error::Error for OAuthError {}

pub type Result<T> = std::result::Result<T, OAuthError>;
