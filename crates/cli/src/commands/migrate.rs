//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

use tracing::info;

use driftwood_checkout::config::CheckoutConfig;
use driftwood_checkout::db;

/// Run the checkout schema migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CheckoutConfig::from_env()?;

    info!("Connecting to checkout database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    info!("Running checkout migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Checkout migrations complete!");
    Ok(())
}
