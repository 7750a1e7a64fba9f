//! Database operations for the checkout `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `customers` - Customer identities (email/tax-id unique among non-deleted)
//! - `addresses` - Customer-owned addresses (cascade-deleted with customer)
//! - `products` - Catalog with stock (CHECK stock >= 0)
//! - `orders` / `order_items` - Order headers and line-item snapshots
//! - `order_status_events` - Append-only status history
//! - `audit_entries` - Append-only before/after audit log
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p driftwood-cli -- migrate
//! ```
//!
//! # Query style
//!
//! All queries use the runtime-checked sqlx API (`sqlx::query_as` with
//! `bind`) against `#[derive(sqlx::FromRow)]` row types, so the workspace
//! builds without a live database. Write-path functions take
//! `&mut PgConnection` and participate in whatever transaction the caller
//! opened; read-only surfaces take `&PgPool`.

pub mod addresses;
pub mod audit;
pub mod customers;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Embedded migrator for the checkout schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Pool size
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error to `Conflict` when it is a violation of the named
/// constraint, passing everything else through as `Database`.
pub(crate) fn conflict_on(err: sqlx::Error, constraint: &str, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return RepositoryError::Conflict(message.to_string());
    }
    RepositoryError::Database(err)
}
