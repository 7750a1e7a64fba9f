//! Database operations for the product catalog and stock ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use driftwood_core::ProductId;

use super::{RepositoryError, conflict_on};
use crate::models::{Product, SeedProductInput};

/// Unique index on product SKUs.
pub const SKU_UNIQUE_CONSTRAINT: &str = "products_sku_key";
/// CHECK constraint keeping stock non-negative.
pub const STOCK_CHECK_CONSTRAINT: &str = "products_stock_check";

const SELECT_COLUMNS: &str =
    "id, sku, name, unit_price, stock, active, specification, created_at, updated_at";

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    sku: String,
    name: String,
    unit_price: Decimal,
    stock: i32,
    active: bool,
    specification: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            sku: row.sku,
            name: row.name,
            unit_price: row.unit_price,
            stock: row.stock,
            active: row.active,
            specification: row.specification,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Find an active, non-deleted product by SKU.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_active_by_sku(
    conn: &mut PgConnection,
    sku: &str,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM products \
         WHERE sku = $1 AND active AND deleted_at IS NULL"
    ))
    .bind(sku)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Read current stock for a product. Pure read, no locks.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn stock_of(pool: &PgPool, product_id: ProductId) -> Result<i32, RepositoryError> {
    let stock: Option<i32> =
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 AND deleted_at IS NULL")
            .bind(product_id.as_i32())
            .fetch_optional(pool)
            .await?;

    stock.ok_or(RepositoryError::NotFound)
}

/// Read current stock for a product, locking its row for the remainder of
/// the transaction.
///
/// Concurrent checkouts for the same product serialize here, so the
/// check-then-decrement sequence cannot oversell.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn stock_for_update(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<i32, RepositoryError> {
    let stock: Option<i32> = sqlx::query_scalar(
        "SELECT stock FROM products WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(product_id.as_i32())
    .fetch_optional(conn)
    .await?;

    stock.ok_or(RepositoryError::NotFound)
}

/// Subtract `quantity` from a product's stock, unconditionally.
///
/// Callers must have verified `stock >= quantity` under the row lock taken
/// by [`stock_for_update`]; the `stock >= 0` CHECK is the last backstop.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the decrement would drive stock
/// negative, `RepositoryError::NotFound` if the product doesn't exist,
/// `RepositoryError::Database` otherwise.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    debug_assert!(quantity > 0, "decrement quantity must be positive");

    let result = sqlx::query(
        "UPDATE products SET stock = stock - $2, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(product_id.as_i32())
    .bind(quantity)
    .execute(conn)
    .await
    .map_err(|e| conflict_on(e, STOCK_CHECK_CONSTRAINT, "stock would go negative"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Insert a catalog product (seeding only).
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the SKU already exists,
/// `RepositoryError::Database` otherwise.
pub async fn insert_product(
    conn: &mut PgConnection,
    input: &SeedProductInput,
) -> Result<Product, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products (sku, name, unit_price, stock, active, specification) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(&input.sku)
    .bind(&input.name)
    .bind(input.unit_price)
    .bind(input.stock)
    .bind(input.active)
    .bind(&input.specification)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on(e, SKU_UNIQUE_CONSTRAINT, "SKU already exists"))?;

    Ok(row.into())
}

/// List active products at or below a stock threshold, lowest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn low_stock(pool: &PgPool, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM products \
         WHERE stock <= $1 AND active AND deleted_at IS NULL \
         ORDER BY stock ASC, sku ASC"
    ))
    .bind(threshold)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
