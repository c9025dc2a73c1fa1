/// Authentication guard
///
/// Runs before every protected route. Resolves the caller from the access
/// cookie or rejects the request; nothing downstream runs on failure.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::security::fingerprint::{fingerprint, fingerprint_matches};
use crate::security::token::{self, TokenError, TokenPurpose};
use crate::AppState;

pub const ACCESS_COOKIE: &str = "Access-Token";

/// Identity resolved by the guard, available to handlers via extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Validate the access token end to end:
/// cookie present -> claims decodable -> subject exists -> signature and
/// expiry hold under the subject's current key -> a live session carries
/// this token's fingerprint. The signature re-check against the per-user
/// key is what retires tokens the moment the password changes, even before
/// their session rows are pruned.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            AppError::authentication(
                "access token missing",
                "Authentication failed. Login to continue",
            )
        })?;

    let claims = token::decode_insecure(&token).map_err(|_| invalid_access_token())?;

    let user = db::users::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(invalid_access_token)?;

    let key = token::signing_key(&state.config.auth.token_secret, &user.password_hash);
    let claims = token::verify(&token, &key, TokenPurpose::Access).map_err(|e| match e {
        TokenError::Expired => AppError::authentication(
            "expired access token",
            "Authentication failed. Login to continue",
        ),
        TokenError::Invalid => invalid_access_token(),
    })?;

    let session = db::sessions::find(&state.db, &claims.jti, user.id)
        .await?
        .ok_or_else(invalid_access_token)?;

    if !fingerprint_matches(&fingerprint(&token), &session.token_fingerprint) {
        return Err(invalid_access_token());
    }

    request.extensions_mut().insert(CurrentUser { id: user.id });

    Ok(next.run(request).await)
}

fn invalid_access_token() -> AppError {
    AppError::authentication(
        "invalid access token",
        "Authentication failed. Login to continue",
    )
}
