// Opaque token generation: OS random bytes -> SHA-256 -> lowercase hex

use crate::session::errors::TokenError;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes drawn per token (256 bits)
pub const TOKEN_ENTROPY_BYTES: usize = 32;

/// Length of the hex-encoded SHA-256 digest every token is rendered as
pub const TOKEN_HEX_LEN: usize = 64;

/// Generate one opaque token string
///
/// # Errors
///
/// Returns `TokenGenerationFailure` if the OS random source cannot be read
pub fn generate_token(kind: &'static str) -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::TokenGenerationFailure {
            kind,
            reason: e.to_string(),
        })?;
    Ok(digest_hex(&bytes))
}

/// Hex-encoded SHA-256 of the given bytes
#[must_use]
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_hex_digest() {
        let token = generate_token("access").unwrap();
        assert_eq!(token.len(), TOKEN_HEX_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_tokens_differ() {
        let a = generate_token("access").unwrap();
        let b = generate_token("access").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_hex_known_value() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
