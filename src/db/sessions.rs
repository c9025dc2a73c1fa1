/// Session database operations
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Session;

pub async fn create(
    pool: &PgPool,
    jti: &str,
    user_id: Uuid,
    token_fingerprint: &str,
) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, token_fingerprint)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, token_fingerprint, created_at
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .bind(token_fingerprint)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Look up a session by the token's jti and owning user.
pub async fn find(pool: &PgPool, jti: &str, user_id: Uuid) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT id, user_id, token_fingerprint, created_at
        FROM sessions
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Delete the session holding this fingerprint. Zero rows affected is not
/// an error; logging out an already-dead session is idempotent.
pub async fn delete_by_fingerprint(
    pool: &PgPool,
    user_id: Uuid,
    token_fingerprint: &str,
) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token_fingerprint = $2")
            .bind(user_id)
            .bind(token_fingerprint)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

/// Forced global logout, used after a password change.
pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
