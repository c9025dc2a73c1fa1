/// Authentication handlers
///
/// Thin HTTP layer over `services::auth`: schema validation, cookie
/// round-tripping, status codes. Each successful stage clears the
/// previous-stage cookie and sets the next.
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{require_auth, CurrentUser, ACCESS_COOKIE};
use crate::services::auth::AuthService;
use crate::services::sessions::SessionManager;
use crate::AppState;

pub const VERIFICATION_COOKIE: &str = "Verification-Token";

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logout", delete(logout))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/login/verify", post(verify_login))
        .route("/reset-password", post(request_password_reset))
        .route("/reset-password/verify", post(verify_password_reset))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyLoginRequest {
    #[validate(range(min = 1000, max = 9999))]
    pub code: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyResetPasswordRequest {
    #[validate(range(min = 1000, max = 9999))]
    pub code: u32,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<StatusCode> {
    payload
        .validate()
        .map_err(|e| AppError::validation("schema", e.to_string()))?;

    let service = AuthService::new(state.db.clone(), state.config.clone(), state.mailer.clone());
    service
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(StatusCode::CREATED)
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, StatusCode)> {
    payload
        .validate()
        .map_err(|e| AppError::validation("schema", e.to_string()))?;

    let service = AuthService::new(state.db.clone(), state.config.clone(), state.mailer.clone());
    let verification_token = service.start_login(&payload.email, &payload.password).await?;

    let jar = jar.add(auth_cookie(
        VERIFICATION_COOKIE,
        verification_token,
        state.config.auth.secure_cookies,
        verification_max_age(&state),
    ));

    Ok((jar, StatusCode::CREATED))
}

async fn verify_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VerifyLoginRequest>,
) -> Result<(CookieJar, StatusCode)> {
    payload
        .validate()
        .map_err(|e| AppError::validation("schema", e.to_string()))?;

    let verification_token = jar.get(VERIFICATION_COOKIE).map(|c| c.value().to_string());

    let service = AuthService::new(state.db.clone(), state.config.clone(), state.mailer.clone());
    let access_token = service
        .complete_login(payload.code, verification_token.as_deref())
        .await?;

    let jar = jar
        .remove(removal_cookie(VERIFICATION_COOKIE))
        .add(auth_cookie(
            ACCESS_COOKIE,
            access_token,
            state.config.auth.secure_cookies,
            access_max_age(&state),
        ));

    Ok((jar, StatusCode::CREATED))
}

async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    // The guard already vouched for the cookie; it is only read back here
    // so the matching session row can be deleted.
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        let sessions = SessionManager::new(state.db.clone(), state.config.auth.clone());
        sessions.revoke(current_user.id, cookie.value()).await?;
    }

    let jar = jar.remove(removal_cookie(ACCESS_COOKIE));

    Ok((jar, StatusCode::NO_CONTENT))
}

async fn request_password_reset(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, StatusCode)> {
    payload
        .validate()
        .map_err(|e| AppError::validation("schema", e.to_string()))?;

    let service = AuthService::new(state.db.clone(), state.config.clone(), state.mailer.clone());
    let verification_token = service.start_password_reset(&payload.email).await?;

    let jar = jar.add(auth_cookie(
        VERIFICATION_COOKIE,
        verification_token,
        state.config.auth.secure_cookies,
        verification_max_age(&state),
    ));

    Ok((jar, StatusCode::ACCEPTED))
}

async fn verify_password_reset(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VerifyResetPasswordRequest>,
) -> Result<(CookieJar, StatusCode)> {
    payload
        .validate()
        .map_err(|e| AppError::validation("schema", e.to_string()))?;

    let verification_token = jar.get(VERIFICATION_COOKIE).map(|c| c.value().to_string());

    let service = AuthService::new(state.db.clone(), state.config.clone(), state.mailer.clone());
    service
        .complete_password_reset(payload.code, verification_token.as_deref(), &payload.password)
        .await?;

    // All sessions are gone; drop both cookies.
    let jar = jar
        .remove(removal_cookie(VERIFICATION_COOKIE))
        .remove(removal_cookie(ACCESS_COOKIE));

    Ok((jar, StatusCode::NO_CONTENT))
}

fn auth_cookie(name: &'static str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

fn verification_max_age(state: &AppState) -> Duration {
    Duration::minutes(state.config.auth.verification_ttl_minutes)
}

fn access_max_age(state: &AppState) -> Duration {
    Duration::days(state.config.auth.access_ttl_days)
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_schema() {
        let ok = RegisterRequest {
            name: "Alice".into(),
            email: "alice@x.com".into(),
            password: "password123".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            name: "Alice".into(),
            email: "not-an-email".into(),
            password: "password123".into(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Alice".into(),
            email: "alice@x.com".into(),
            password: "short".into(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn verify_request_rejects_out_of_range_codes() {
        assert!(VerifyLoginRequest { code: 4821 }.validate().is_ok());
        assert!(VerifyLoginRequest { code: 999 }.validate().is_err());
        assert!(VerifyLoginRequest { code: 10_000 }.validate().is_err());
    }

    #[test]
    fn cookies_are_http_only() {
        let cookie = auth_cookie(ACCESS_COOKIE, "token".into(), false, Duration::days(7));
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn cookies_expire_with_their_tokens() {
        let verification = auth_cookie(
            VERIFICATION_COOKIE,
            "token".into(),
            false,
            Duration::minutes(10),
        );
        assert_eq!(verification.max_age(), Some(Duration::minutes(10)));

        let access = auth_cookie(ACCESS_COOKIE, "token".into(), false, Duration::days(7));
        assert_eq!(access.max_age(), Some(Duration::days(7)));
    }
}
