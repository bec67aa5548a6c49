//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Database connection URL for the backup metadata store
    pub database_url: String,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Maximum pooled connections to the metadata store
    pub db_max_connections: u32,

    /// Upper bound for a single store call, also used as the pool acquire timeout
    pub store_timeout_secs: u64,

    /// Default window of the backup overview, in hours
    pub overview_window_hours: i64,

    /// Default number of rows per dashboard page
    pub page_size: usize,

    /// JWT secret key for signing admin tokens
    pub jwt_secret: String,

    /// JWT access token expiry in minutes
    pub jwt_access_token_expiry_minutes: i64,

    /// Name of the privileged admin user
    pub admin_username: String,

    /// bcrypt hash of the admin password; admin login is disabled when unset
    pub admin_password_hash: Option<String>,

    /// OTLP endpoint for trace export (optional)
    pub otel_endpoint: Option<String>,
}

redacted_debug!(Config {
    mask_url database_url,
    show bind_address,
    show db_max_connections,
    show store_timeout_secs,
    show overview_window_hours,
    show page_size,
    redact jwt_secret,
    show jwt_access_token_expiry_minutes,
    show admin_username,
    redact_option admin_password_hash,
    show otel_endpoint,
});

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", 10),
            overview_window_hours: parse_or("OVERVIEW_WINDOW_HOURS", 48),
            page_size: parse_or("PAGE_SIZE", 25),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::Config("JWT_SECRET not set".into()))?,
            jwt_access_token_expiry_minutes: parse_or("JWT_ACCESS_TOKEN_EXPIRY_MINUTES", 30),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH")
                .ok()
                .filter(|h| !h.is_empty()),
            otel_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_secs == 0 {
            return Err(AppError::Config("STORE_TIMEOUT_SECS must be positive".into()));
        }
        if self.overview_window_hours <= 0 {
            return Err(AppError::Config(
                "OVERVIEW_WINDOW_HOURS must be positive".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(AppError::Config("PAGE_SIZE must be positive".into()));
        }
        if self.jwt_secret.len() < 16 {
            return Err(AppError::Config(
                "JWT_SECRET must be at least 16 characters".into(),
            ));
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn overview_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.overview_window_hours)
    }
}
