//! Secret generation and hashing using `ring`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::error::{OAuthError, Result};

/// Default number of random bytes behind every opaque secret.
pub const SECRET_BYTES: usize = 32;

/// Shortest secret the issuer will mint.
pub const MIN_SECRET_BYTES: usize = 16;

/// Generate an opaque secret from the system CSPRNG, base64url encoded without padding.
///
/// Lengths below [`MIN_SECRET_BYTES`] are refused.
pub fn generate_secret(len: usize) -> Result<String> {
    if len < MIN_SECRET_BYTES {
        warn!(len, min = MIN_SECRET_BYTES, "refusing to mint a short secret");
        return Err(OAuthError::ServerError);
    }
    let rng = SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf).map_err(|_| OAuthError::ServerError)?;
    Ok(URL_SAFE_NO_PAD.encode(&buf))
}

/// SHA-256 of the secret, base64url encoded without padding.
pub fn hash_secret(secret: &str) -> String {
    let hash = digest::digest(&digest::SHA256, secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

/// Compare two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
