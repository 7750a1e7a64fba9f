//! Seed the product catalog.
//!
//! Reads products from a JSON file and inserts them in one transaction.
//! Products whose SKU already exists are skipped, so re-running the command
//! against a seeded database is harmless.

use std::path::Path;

use tracing::{info, warn};

use driftwood_checkout::config::CheckoutConfig;
use driftwood_checkout::db::{self, RepositoryError};
use driftwood_checkout::models::SeedProductInput;

/// Seed catalog products from a JSON file.
///
/// # Arguments
///
/// * `file_path` - Path to a JSON array of products
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, or a database operation fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = CheckoutConfig::from_env()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<SeedProductInput> = serde_json::from_str(&content)?;

    info!(products = products.len(), "Parsed catalog");

    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for product in &products {
        match db::products::insert_product(&mut *tx, product).await {
            Ok(created) => {
                info!(sku = %created.sku, stock = created.stock, "Seeded product");
                inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(sku = %product.sku, "SKU already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().await?;

    info!(inserted, skipped, "Catalog seeding complete");
    Ok(())
}
