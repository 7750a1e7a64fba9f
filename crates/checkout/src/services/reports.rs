//! Read-only reporting and order-lookup surface.
//!
//! Everything here is side-effect free and safe to call at any time.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use driftwood_core::{OrderId, OrderStatus};

use crate::db;
use crate::error::CheckoutError;
use crate::models::{OrderWithDetails, Product};

/// Order count for one lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Aggregates backing the store dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Non-deleted customers.
    pub customers: i64,
    /// Orders created today.
    pub orders_today: i64,
    /// Cumulative revenue over settled statuses.
    pub settled_revenue: Decimal,
    /// Per-status order counts.
    pub orders_by_status: Vec<StatusCount>,
    /// Active products at or below the stock threshold, lowest first.
    pub low_stock: Vec<Product>,
}

/// Build the dashboard summary.
///
/// # Errors
///
/// Returns `Storage` if any query fails.
pub async fn dashboard_summary(
    pool: &PgPool,
    low_stock_threshold: i32,
) -> Result<DashboardSummary, CheckoutError> {
    let customers = db::customers::count_customers(pool).await?;
    let orders_today = db::orders::count_today(pool).await?;
    let settled_revenue = db::orders::settled_revenue(pool).await?;
    let orders_by_status = db::orders::count_by_status(pool)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    let low_stock = db::products::low_stock(pool, low_stock_threshold).await?;

    Ok(DashboardSummary {
        customers,
        orders_today,
        settled_revenue,
        orders_by_status,
        low_stock,
    })
}

/// Load a full order (items + status history) by order number.
///
/// # Errors
///
/// Returns `OrderNotFound` if the number does not resolve, `Storage` if a
/// query fails.
pub async fn order_by_number(
    pool: &PgPool,
    order_number: &str,
) -> Result<OrderWithDetails, CheckoutError> {
    db::orders::get_with_details_by_number(pool, order_number)
        .await?
        .ok_or_else(|| CheckoutError::OrderNotFound(order_number.to_string()))
}

/// Load a full order (items + status history) by ID.
///
/// # Errors
///
/// Returns `OrderNotFound` if the id does not resolve, `Storage` if a
/// query fails.
pub async fn order_by_id(pool: &PgPool, id: OrderId) -> Result<OrderWithDetails, CheckoutError> {
    db::orders::get_with_details(pool, id)
        .await?
        .ok_or_else(|| CheckoutError::OrderNotFound(id.to_string()))
}
