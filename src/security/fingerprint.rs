/// Token fingerprints
///
/// The store never holds a raw token, only its SHA-256 digest. A plain
/// cryptographic hash is enough here: the input space is signed tokens,
/// already high-entropy, so a slow password hash would buy nothing.
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a token string (64 chars).
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a computed fingerprint against a stored one in constant time.
pub fn fingerprint_matches(a: &str, b: &str) -> bool {
    constant_time_compare(a.as_bytes(), b.as_bytes())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_hex() {
        let fp = fingerprint("some.signed.token");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, fingerprint("some.signed.token"));
        assert_ne!(fp, fingerprint("some.signed.token2"));
    }

    #[test]
    fn comparison_semantics() {
        let fp = fingerprint("token");
        assert!(fingerprint_matches(&fp, &fingerprint("token")));
        assert!(!fingerprint_matches(&fp, &fingerprint("other")));
        assert!(!fingerprint_matches(&fp, &fp[..32]));
    }
}
