//! Access-token generation.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates a new opaque access token: 64 lowercase hex characters.
///
/// 32 bytes (256 bits) are drawn from the thread-local CSPRNG and run
/// through SHA-256. Only the digest ever leaves this function, so the
/// random seed is never stored anywhere. With 256 bits of entropy a
/// collision is not a practical concern.
pub fn generate_token() -> String {
    let seed: [u8; 32] = rand::rng().random();
    hex::encode(Sha256::digest(seed))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_token_is_64_lowercase_hex_chars() {
        let token = generate_token();

        assert_eq!(token.len(), 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
            "unexpected character in {token}"
        );
    }

    #[test]
    fn test_generate_token_never_repeats() {
        let tokens: HashSet<String> = (0..1_000).map(|_| generate_token()).collect();

        assert_eq!(tokens.len(), 1_000);
    }
}
