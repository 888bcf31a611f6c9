//! Database connection settings for the persisted game store.

use std::env;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::error::AppError;

/// `WEREWOLF_DATABASE_URL`, when set; rooms are kept in memory otherwise.
pub fn database_url() -> Option<String> {
    env::var("WEREWOLF_DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Open a pool for `url` (`sqlite::memory:`, `sqlite://...`, `postgres://...`).
pub async fn connect(url: &str) -> Result<DatabaseConnection, AppError> {
    let mut opts = ConnectOptions::new(url.to_owned());
    if url.starts_with("sqlite::memory:") {
        // every pooled connection would otherwise get its own empty database
        opts.max_connections(1).min_connections(1);
    }
    opts.sqlx_logging(false);
    Database::connect(opts)
        .await
        .map_err(|e| AppError::config(format!("cannot connect to '{url}': {e}")))
}
