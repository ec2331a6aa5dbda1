//! Token endpoint configuration.

use chrono::Duration;
use tracing::warn;

use super::crypto::{MIN_SECRET_BYTES, SECRET_BYTES};

pub const AUTHORIZATION_CODE: &str = "authorization_code";
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Lifetimes, transport policy and grant allow-list for the token endpoint.
#[derive(Debug, Clone)]
pub struct GrantConfig {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub authorization_code_ttl: Duration,
    /// Accept plain-text requests. Never enable outside tests.
    pub test_mode: bool,
    pub grant_types: Vec<String>,
    pub secret_bytes: usize,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantConfig {
    /// Creates a config with a 30 day access lifetime, a 365 day refresh lifetime
    /// and the two built-in grant types.
    pub fn new() -> Self {
        GrantConfig {
            access_token_ttl: Duration::days(30),
            refresh_token_ttl: Duration::days(365),
            authorization_code_ttl: Duration::minutes(10),
            test_mode: false,
            grant_types: vec![AUTHORIZATION_CODE.to_string(), REFRESH_TOKEN.to_string()],
            secret_bytes: SECRET_BYTES,
        }
    }

    /// Reads overrides from `OAUTH2_*` environment variables; unset or unparsable values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(flag) = env_var("OAUTH2_TEST_MODE") {
            config.test_mode = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        if let Some(ttl) = env_lifetime("OAUTH2_ACCESS_TOKEN_TTL") {
            config.access_token_ttl = ttl;
        }
        if let Some(ttl) = env_lifetime("OAUTH2_REFRESH_TOKEN_TTL") {
            config.refresh_token_ttl = ttl;
        }
        if let Some(ttl) = env_lifetime("OAUTH2_AUTH_CODE_TTL") {
            config.authorization_code_ttl = ttl;
        }
        if let Some(list) = env_var("OAUTH2_GRANT_TYPES") {
            config.grant_types = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_ttl = ttl;
        self
    }

    pub fn with_authorization_code_ttl(mut self, ttl: Duration) -> Self {
        self.authorization_code_ttl = ttl;
        self
    }

    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Adds a grant type to the allow-list.
    pub fn allow_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        let grant_type = grant_type.into();
        if !self.grant_types.contains(&grant_type) {
            self.grant_types.push(grant_type);
        }
        self
    }

    /// Sets the secret length in bytes, raised to the minimum the issuer accepts.
    pub fn with_secret_bytes(mut self, bytes: usize) -> Self {
        self.secret_bytes = bytes.max(MIN_SECRET_BYTES);
        self
    }

    pub fn is_allowed(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant_type)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_lifetime(key: &str) -> Option<Duration> {
    let raw = env_var(key)?;
    let ttl = parse_lifetime(&raw);
    if ttl.is_none() {
        warn!(key, value = %raw, "ignoring invalid lifetime");
    }
    ttl
}

/// Positive whole seconds that fit in a `Duration`.
fn parse_lifetime(raw: &str) -> Option<Duration> {
    match raw.parse::<i64>() {
        Ok(secs) if secs > 0 => Duration::try_seconds(secs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GrantConfig::new();
        assert_eq!(config.access_token_ttl.num_seconds(), 30 * 24 * 3600);
        assert_eq!(config.refresh_token_ttl.num_seconds(), 365 * 24 * 3600);
        assert!(!config.test_mode);
        assert!(config.is_allowed("authorization_code"));
        assert!(config.is_allowed("refresh_token"));
        assert!(!config.is_allowed("password"));
    }

    #[test]
    fn allow_list_extends_once() {
        let config = GrantConfig::new().allow_grant_type("device_code").allow_grant_type("device_code");
        assert_eq!(config.grant_types.len(), 3);
        assert!(config.is_allowed("device_code"));
    }

    #[test]
    fn lifetimes_must_fit() {
        assert_eq!(parse_lifetime("3600"), Some(Duration::hours(1)));
        assert_eq!(parse_lifetime("0"), None);
        assert_eq!(parse_lifetime("-5"), None);
        assert_eq!(parse_lifetime("soon"), None);
        assert_eq!(parse_lifetime("9223372036854775807"), None);
    }

    #[test]
    fn secret_length_has_a_floor() {
        assert_eq!(GrantConfig::new().with_secret_bytes(0).secret_bytes, MIN_SECRET_BYTES);
        assert_eq!(GrantConfig::new().with_secret_bytes(48).secret_bytes, 48);
    }
}
