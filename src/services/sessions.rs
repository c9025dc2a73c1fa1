/// Session manager
///
/// Turns a verified identity into a long-lived access token and keeps the
/// matching server-side record so the token stays revocable independently
/// of its expiry.
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::db;
use crate::error::Result;
use crate::models::User;
use crate::security::fingerprint::fingerprint;
use crate::security::token::{self, TokenPurpose};

pub struct SessionManager {
    db: PgPool,
    auth: AuthSettings,
}

impl SessionManager {
    pub fn new(db: PgPool, auth: AuthSettings) -> Self {
        Self { db, auth }
    }

    /// Issue an access token and persist the session it belongs to.
    pub async fn create(&self, user: &User) -> Result<String> {
        let key = token::signing_key(&self.auth.token_secret, &user.password_hash);
        let issued = token::issue(user.id, TokenPurpose::Access, self.auth.access_ttl(), &key)
            .map_err(|e| anyhow::anyhow!("Failed to issue access token: {}", e))?;

        db::sessions::create(
            &self.db,
            &issued.claims.jti,
            user.id,
            &fingerprint(&issued.token),
        )
        .await?;

        tracing::info!(user_id = %user.id, "Session created");
        Ok(issued.token)
    }

    /// Revoke the session behind this token. Idempotent: revoking an
    /// already-dead session is not an error.
    pub async fn revoke(&self, user_id: Uuid, token: &str) -> Result<()> {
        let deleted =
            db::sessions::delete_by_fingerprint(&self.db, user_id, &fingerprint(token)).await?;

        if deleted == 0 {
            tracing::debug!(user_id = %user_id, "Revoke matched no live session");
        } else {
            tracing::info!(user_id = %user_id, "Session revoked");
        }
        Ok(())
    }

    /// Revoke every session for the user; used after a password change.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<()> {
        let deleted = db::sessions::delete_all_for_user(&self.db, user_id).await?;
        tracing::info!(user_id = %user_id, sessions = deleted, "All sessions revoked");
        Ok(())
    }
}
