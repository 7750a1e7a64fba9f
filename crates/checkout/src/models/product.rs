//! Product domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use driftwood_core::ProductId;

/// A catalog product.
///
/// Seeded once at initialization; after that, `stock` is mutated only
/// through the inventory ledger's decrement operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Stock-keeping unit, unique across the catalog.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit price. Never negative.
    pub unit_price: Decimal,
    /// Units on hand. Never negative (DB CHECK backstop).
    pub stock: i32,
    /// Whether the product can be ordered.
    pub active: bool,
    /// Free-form specification payload.
    pub specification: Option<serde_json::Value>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for seeding a catalog product.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProductInput {
    /// Stock-keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Initial stock quantity.
    pub stock: i32,
    /// Whether the product can be ordered (default: true).
    #[serde(default = "default_active")]
    pub active: bool,
    /// Free-form specification payload.
    #[serde(default)]
    pub specification: Option<serde_json::Value>,
}

const fn default_active() -> bool {
    true
}
