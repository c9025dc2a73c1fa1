/// Token codec
///
/// Mints and validates the two token kinds the service uses: short-lived
/// verification tokens (paired with an OTP challenge) and long-lived access
/// tokens (backed by a session row). HS256 with a per-user key: the
/// server-wide secret concatenated with the user's current password hash,
/// so a password change invalidates every outstanding token for that user
/// without a revocation list.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random bytes in a freshly minted jti (48 hex chars on the wire).
const TOKEN_ID_BYTES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Verification,
    Access,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: Uuid,
    /// Unique per issuance; keys the server-side record.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub purpose: TokenPurpose,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Derive the signing key for a user: server secret plus the current
/// password hash.
pub fn signing_key(secret: &str, password_hash: &str) -> String {
    format!("{}{}", secret, password_hash)
}

/// Mint a signed token for `user_id` with a fresh random jti.
pub fn issue(
    user_id: Uuid,
    purpose: TokenPurpose,
    ttl: Duration,
    key: &str,
) -> Result<IssuedToken, TokenError> {
    let mut jti_bytes = [0u8; TOKEN_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut jti_bytes);

    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        jti: hex::encode(jti_bytes),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        purpose,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)?;

    Ok(IssuedToken { token, claims })
}

/// Validate signature, expiry and claim shape, in that order, and check the
/// token was minted for `expected_purpose`.
pub fn verify(
    token: &str,
    key: &str,
    expected_purpose: TokenPurpose,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(key.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.purpose != expected_purpose {
        return Err(TokenError::Invalid);
    }

    Ok(data.claims)
}

/// Decode claims without checking signature or expiry. Only ever used to
/// learn the subject so the per-user key can be loaded; the token must
/// still pass `verify` before it proves anything.
pub fn decode_insecure(token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["sub"]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| TokenError::Invalid)?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let uid = user();
        let key = signing_key("server-secret", "$argon2id$fakehash");
        let issued = issue(uid, TokenPurpose::Access, Duration::days(7), &key).unwrap();

        let claims = verify(&issued.token, &key, TokenPurpose::Access).unwrap();
        assert_eq!(claims.sub, uid);
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.purpose, TokenPurpose::Access);
    }

    #[test]
    fn jti_is_unique_per_issuance() {
        let uid = user();
        let key = signing_key("secret", "hash");
        let a = issue(uid, TokenPurpose::Verification, Duration::minutes(10), &key).unwrap();
        let b = issue(uid, TokenPurpose::Verification, Duration::minutes(10), &key).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
        assert_eq!(a.claims.jti.len(), TOKEN_ID_BYTES * 2);
    }

    #[test]
    fn expired_token_is_rejected() {
        let uid = user();
        let key = signing_key("secret", "hash");
        let issued = issue(uid, TokenPurpose::Access, Duration::seconds(-10), &key).unwrap();

        let err = verify(&issued.token, &key, TokenPurpose::Access).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn purpose_mismatch_is_invalid() {
        let uid = user();
        let key = signing_key("secret", "hash");
        let issued = issue(uid, TokenPurpose::Verification, Duration::minutes(10), &key).unwrap();

        let err = verify(&issued.token, &key, TokenPurpose::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn password_change_invalidates_outstanding_tokens() {
        let uid = user();
        let old_key = signing_key("secret", "old-password-hash");
        let issued = issue(uid, TokenPurpose::Access, Duration::days(7), &old_key).unwrap();

        // Signature holds under the old key, fails under the rederived one.
        assert!(verify(&issued.token, &old_key, TokenPurpose::Access).is_ok());
        let new_key = signing_key("secret", "new-password-hash");
        let err = verify(&issued.token, &new_key, TokenPurpose::Access).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn garbage_input_is_invalid_not_a_panic() {
        assert_eq!(
            verify("not-a-token", "key", TokenPurpose::Access).unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(decode_insecure("").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn insecure_decode_reads_claims_of_expired_tokens() {
        let uid = user();
        let key = signing_key("secret", "hash");
        let issued = issue(uid, TokenPurpose::Access, Duration::seconds(-10), &key).unwrap();

        let claims = decode_insecure(&issued.token).unwrap();
        assert_eq!(claims.sub, uid);
    }
}
