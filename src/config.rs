use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Server-wide secret mixed with the user's password hash to derive
    /// the per-user token signing key.
    pub token_secret: String,
    #[serde(default = "default_verification_ttl_minutes")]
    pub verification_ttl_minutes: i64,
    #[serde(default = "default_access_ttl_days")]
    pub access_ttl_days: i64,
    /// When true, login is refused until the account's email is verified.
    #[serde(default)]
    pub require_verified_email: bool,
    /// Mark cookies Secure. Off by default so local HTTP works.
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Empty host puts the mailer in no-op mode (codes are logged only).
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_verification_ttl_minutes() -> i64 {
    10
}

fn default_access_ttl_days() -> i64 {
    7
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "Auth API <no-reply@localhost>".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/auth_api")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_secret", "development-secret-change-in-production")?
            .set_default("auth.verification_ttl_minutes", 10)?
            .set_default("auth.access_ttl_days", 7)?
            .set_default("auth.require_verified_email", false)?
            .set_default("auth.secure_cookies", false)?
            .set_default("email.smtp_host", "")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.smtp_from", "Auth API <no-reply@localhost>")?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl AuthSettings {
    pub fn verification_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.verification_ttl_minutes)
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.access_ttl_days)
    }
}
