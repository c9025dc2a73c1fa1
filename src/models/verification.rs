/// Verification challenge model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One outstanding OTP challenge. `id` is the jti of the verification
/// token; at most one row exists per (user, purpose), the most recently
/// issued one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Verification {
    pub id: String,
    pub user_id: Uuid,
    pub token_fingerprint: String,
    pub otp_code: i32,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

/// What a challenge was issued for. Stored on the row so issuing a new
/// challenge replaces only the prior one of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePurpose {
    Login,
    PasswordReset,
}

impl ChallengePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengePurpose::Login => "login",
            ChallengePurpose::PasswordReset => "password_reset",
        }
    }
}

impl std::fmt::Display for ChallengePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
