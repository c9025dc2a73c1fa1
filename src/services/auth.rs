/// Authentication flows
///
/// Registration, password login gated by an emailed OTP, and password
/// reset. Each flow that hands out a code follows the same shape: issue a
/// verification token, persist the challenge (replacing any prior one for
/// the same purpose), email the code, and later verify token + code
/// together before acting.
use rand::thread_rng;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::error::{AppError, Result};
use crate::models::{ChallengePurpose, User, Verification};
use crate::security::fingerprint::{fingerprint, fingerprint_matches};
use crate::security::otp;
use crate::security::password::{hash_password, verify_password};
use crate::security::token::{self, TokenError, TokenPurpose};
use crate::services::email::{mask_email, EmailService};
use crate::services::sessions::SessionManager;

pub struct AuthService {
    db: PgPool,
    config: Config,
    mailer: EmailService,
}

/// Does this stored challenge belong to the presented token and the purpose
/// the flow expects? Fingerprints are compared in constant time. A valid
/// signature alone is not enough; this is what rejects a substituted token
/// whose jti happens to match a live record.
pub fn challenge_matches(record: &Verification, token: &str, purpose: ChallengePurpose) -> bool {
    record.purpose == purpose.as_str()
        && fingerprint_matches(&fingerprint(token), &record.token_fingerprint)
}

impl AuthService {
    pub fn new(db: PgPool, config: Config, mailer: EmailService) -> Self {
        Self { db, config, mailer }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        if db::users::find_by_email(&self.db, email).await?.is_some() {
            return Err(AppError::validation(
                "email",
                "An account with the given email already exists",
            ));
        }

        let password_hash = hash_password(password)?;
        let user = db::users::create_user(&self.db, name, email, &password_hash).await?;

        tracing::info!(user_id = %user.id, email = %mask_email(email), "User registered");
        Ok(user)
    }

    /// Check the password and start the OTP challenge. Returns the
    /// verification token to be set as a cookie; the code goes out by mail.
    pub async fn start_login(&self, email: &str, password: &str) -> Result<String> {
        let user = db::users::find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| {
                AppError::validation("email", "An account with the given email does not exist")
            })?;

        if self.config.auth.require_verified_email && !user.verified {
            return Err(AppError::forbidden(
                "email",
                "Email address is not verified",
            ));
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::validation("password", "Password is incorrect"));
        }

        let token = self.issue_challenge(&user, ChallengePurpose::Login).await?;

        tracing::info!(user_id = %user.id, email = %mask_email(email), "Login challenge issued");
        Ok(token)
    }

    /// Verify the login OTP and mint the session. Returns the access token.
    pub async fn complete_login(&self, code: u32, token: Option<&str>) -> Result<String> {
        let user = self
            .verify_challenge(code, token, ChallengePurpose::Login)
            .await?;

        if !user.verified {
            db::users::mark_verified(&self.db, user.id).await?;
        }

        let sessions = SessionManager::new(self.db.clone(), self.config.auth.clone());
        let access_token = sessions.create(&user).await?;

        tracing::info!(user_id = %user.id, "Login completed");
        Ok(access_token)
    }

    pub async fn start_password_reset(&self, email: &str) -> Result<String> {
        let user = db::users::find_by_email(&self.db, email)
            .await?
            .ok_or_else(|| {
                AppError::validation("email", "An account with the given email does not exist")
            })?;

        let token = self
            .issue_challenge(&user, ChallengePurpose::PasswordReset)
            .await?;

        tracing::info!(user_id = %user.id, email = %mask_email(email), "Password reset challenge issued");
        Ok(token)
    }

    /// Verify the reset OTP, replace the password hash and force a global
    /// logout. Every token signed under the old hash dies with it.
    pub async fn complete_password_reset(
        &self,
        code: u32,
        token: Option<&str>,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .verify_challenge(code, token, ChallengePurpose::PasswordReset)
            .await?;

        let password_hash = hash_password(new_password)?;
        db::users::update_password(&self.db, user.id, &password_hash).await?;

        let sessions = SessionManager::new(self.db.clone(), self.config.auth.clone());
        sessions.revoke_all(user.id).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Issue a verification token plus OTP code, persist the challenge and
    /// email the code. If mail dispatch fails the just-written record is
    /// deleted before the error surfaces, so an undelivered code is never
    /// live.
    async fn issue_challenge(&self, user: &User, purpose: ChallengePurpose) -> Result<String> {
        let key = token::signing_key(&self.config.auth.token_secret, &user.password_hash);
        let issued = token::issue(
            user.id,
            TokenPurpose::Verification,
            self.config.auth.verification_ttl(),
            &key,
        )
        .map_err(|e| anyhow::anyhow!("Failed to issue verification token: {}", e))?;

        let code = otp::generate_code(&mut thread_rng());

        db::verifications::replace(
            &self.db,
            user.id,
            &issued.claims.jti,
            &fingerprint(&issued.token),
            code,
            purpose,
        )
        .await?;

        if let Err(e) = self
            .mailer
            .send_otp_email(
                &user.email,
                code,
                self.config.auth.verification_ttl_minutes,
            )
            .await
        {
            db::verifications::delete(&self.db, &issued.claims.jti).await?;
            return Err(e);
        }

        Ok(issued.token)
    }

    /// The five-step OTP check: token presence, token validity under the
    /// subject's current key, record lookup with fingerprint match, code
    /// comparison (a wrong code leaves the record live for retry), and
    /// single-use consumption on success.
    async fn verify_challenge(
        &self,
        code: u32,
        token: Option<&str>,
        purpose: ChallengePurpose,
    ) -> Result<User> {
        let token = token.ok_or_else(|| {
            AppError::authentication(
                "verification token missing",
                "Unable to verify code. Please try again",
            )
        })?;

        let claims = token::decode_insecure(token).map_err(|_| invalid_verification_token())?;

        let user = db::users::find_by_id(&self.db, claims.sub)
            .await?
            .ok_or_else(invalid_verification_token)?;

        let key = token::signing_key(&self.config.auth.token_secret, &user.password_hash);
        token::verify(token, &key, TokenPurpose::Verification).map_err(|e| match e {
            TokenError::Expired => AppError::authentication(
                "expired verification token",
                "The verification code has expired. Please request a new one",
            ),
            TokenError::Invalid => invalid_verification_token(),
        })?;

        let record = db::verifications::find(&self.db, &claims.jti, user.id)
            .await?
            .ok_or_else(invalid_verification_token)?;

        if !challenge_matches(&record, token, purpose) {
            return Err(invalid_verification_token());
        }

        if record.otp_code != code as i32 {
            tracing::warn!(user_id = %user.id, "Incorrect verification code attempt");
            return Err(AppError::authentication(
                "incorrect verification code",
                "The verification code entered is incorrect. Please try again",
            ));
        }

        // Single use: the record must go before we vouch for the identity.
        // A raced double-consume loses here.
        if !db::verifications::delete(&self.db, &record.id).await? {
            return Err(invalid_verification_token());
        }

        Ok(user)
    }
}

fn invalid_verification_token() -> AppError {
    AppError::authentication(
        "invalid verification token",
        "Unable to verify code. Please try again",
    )
}
