//! Database connection pool setup.

use crate::config::Config;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Create a connection pool to the backup metadata store.
///
/// The pool connects lazily so the dashboard can start (and report the store
/// as unavailable) while the database is down. Each connection carries a
/// server-side `statement_timeout` matching the configured store timeout.
pub fn create_pool(config: &Config) -> Result<PgPool> {
    let timeout = config.store_timeout();
    let options = PgConnectOptions::from_str(&config.database_url)?
        .application_name("cbm-backend")
        .options([("statement_timeout", format!("{}", timeout.as_millis()))]);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(0)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(600))
        .connect_lazy_with(options);

    Ok(pool)
}
