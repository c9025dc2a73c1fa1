/// Session model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One live access token. `id` is the token's jti; the raw token is never
/// stored, only its SHA-256 fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub token_fingerprint: String,
    pub created_at: DateTime<Utc>,
}
