/// Verification challenge database operations
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ChallengePurpose, Verification};

/// Persist a freshly issued challenge, replacing any prior live one for the
/// same (user, purpose). Delete and insert run in one transaction so two
/// concurrent issuances can never leave two live codes.
pub async fn replace(
    pool: &PgPool,
    user_id: Uuid,
    jti: &str,
    token_fingerprint: &str,
    otp_code: u32,
    purpose: ChallengePurpose,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM verifications WHERE user_id = $1 AND purpose = $2")
        .bind(user_id)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO verifications (id, user_id, token_fingerprint, otp_code, purpose)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .bind(token_fingerprint)
    .bind(otp_code as i32)
    .bind(purpose.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

/// Look up a challenge by the token's jti and owning user.
pub async fn find(pool: &PgPool, jti: &str, user_id: Uuid) -> Result<Option<Verification>> {
    let verification = sqlx::query_as::<_, Verification>(
        r#"
        SELECT id, user_id, token_fingerprint, otp_code, purpose, created_at
        FROM verifications
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(verification)
}

/// Consume (or clean up) a challenge. Returns whether a row was deleted, so
/// a raced double-consume is detectable.
pub async fn delete(pool: &PgPool, jti: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM verifications WHERE id = $1")
        .bind(jti)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
