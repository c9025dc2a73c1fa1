// Auth API library

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

pub use error::{AppError, Result};

use crate::config::Config;
use crate::services::email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
    pub mailer: EmailService,
}
