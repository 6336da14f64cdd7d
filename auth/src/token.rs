//! Opaque bearer secrets for sessions and one-time links.
//!
//! The raw value only ever leaves the process (cookie, email link); storage
//! keeps the SHA-256 digest and looks tokens up by it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Error)]
#[error("Failed to generate token: {0}")]
pub struct TokenError(String);

/// Generate a URL-safe random token.
///
/// # Errors
/// * `TokenError` - The operating system RNG is unavailable
pub fn generate() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 digest of a raw token, used as the storage key.
pub fn digest(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}
