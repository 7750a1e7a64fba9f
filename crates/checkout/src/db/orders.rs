//! Database operations for orders, line items, and status history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use driftwood_core::{
    AddressId, CustomerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, StatusEventId,
};

use super::RepositoryError;
use crate::models::{
    CreateOrderInput, CreateOrderItemInput, Order, OrderItem, OrderStatusEvent, OrderWithDetails,
    RequestContext,
};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, address_id, subtotal, shipping, \
                             discount, total, status, payment_method, payment_status, \
                             tracking_code, created_at, updated_at";

/// Statuses counted as settled revenue: payment landed and was not returned.
const SETTLED_STATUSES: &str = "('paid', 'processing', 'shipped', 'delivered')";

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    customer_id: i32,
    address_id: i32,
    subtotal: Decimal,
    shipping: Decimal,
    discount: Decimal,
    total: Decimal,
    status: String,
    payment_method: Option<String>,
    payment_status: String,
    tracking_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;
        let payment_status: PaymentStatus = row
            .payment_status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid payment status: {e}")))?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            customer_id: CustomerId::new(row.customer_id),
            address_id: AddressId::new(row.address_id),
            subtotal: row.subtotal,
            shipping: row.shipping,
            discount: row.discount,
            total: row.total,
            status,
            payment_method: row.payment_method,
            payment_status,
            tracking_code: row.tracking_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    sku: String,
    name: String,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            sku: row.sku,
            name: row.name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

/// Internal row type for status event queries.
#[derive(Debug, sqlx::FromRow)]
struct StatusEventRow {
    id: i32,
    order_id: i32,
    previous_status: String,
    new_status: String,
    note: Option<String>,
    actor_public_id: Option<Uuid>,
    caller_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StatusEventRow> for OrderStatusEvent {
    type Error = RepositoryError;

    fn try_from(row: StatusEventRow) -> Result<Self, Self::Error> {
        let previous_status = row
            .previous_status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;
        let new_status = row
            .new_status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;

        Ok(Self {
            id: StatusEventId::new(row.id),
            order_id: OrderId::new(row.order_id),
            previous_status,
            new_status,
            note: row.note,
            actor_public_id: row.actor_public_id,
            caller_ip: row.caller_ip,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

/// Insert an order header with status `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails (including the
/// rare order-number collision, which is safe to retry whole-checkout).
pub async fn insert_order(
    conn: &mut PgConnection,
    input: &CreateOrderInput,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders ( \
             order_number, customer_id, address_id, subtotal, shipping, \
             discount, total, status, payment_method, payment_status \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, 'pending') \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(&input.order_number)
    .bind(input.customer_id.as_i32())
    .bind(input.address_id.as_i32())
    .bind(input.subtotal)
    .bind(input.shipping)
    .bind(input.discount)
    .bind(input.total)
    .bind(&input.payment_method)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Insert line-item snapshots for an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails.
pub async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[CreateOrderItemInput],
) -> Result<Vec<OrderItem>, RepositoryError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let row = sqlx::query_as::<_, OrderItemRow>(
            "INSERT INTO order_items (order_id, sku, name, quantity, unit_price, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, order_id, sku, name, quantity, unit_price, subtotal",
        )
        .bind(order_id.as_i32())
        .bind(&line.sku)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .fetch_one(&mut *conn)
        .await?;
        items.push(row.into());
    }
    Ok(items)
}

/// Find an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_id(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id.as_i32())
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Find an order by its human-readable order number.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_number(
    conn: &mut PgConnection,
    order_number: &str,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
    ))
    .bind(order_number)
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Update an order's lifecycle status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id.as_i32())
        .bind(status.to_string())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Update an order's payment settlement status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn set_payment_status(
    conn: &mut PgConnection,
    id: OrderId,
    payment_status: PaymentStatus,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .bind(payment_status.to_string())
            .execute(conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Append one status-transition event.
///
/// Append-only: nothing in this crate updates or deletes these rows.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn append_status_event(
    conn: &mut PgConnection,
    order_id: OrderId,
    previous_status: OrderStatus,
    new_status: OrderStatus,
    note: Option<&str>,
    actor_public_id: Option<Uuid>,
    context: &RequestContext,
) -> Result<OrderStatusEvent, RepositoryError> {
    let row = sqlx::query_as::<_, StatusEventRow>(
        "INSERT INTO order_status_events ( \
             order_id, previous_status, new_status, note, \
             actor_public_id, caller_ip, user_agent \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, order_id, previous_status, new_status, note, \
                   actor_public_id, caller_ip, user_agent, created_at",
    )
    .bind(order_id.as_i32())
    .bind(previous_status.to_string())
    .bind(new_status.to_string())
    .bind(note)
    .bind(actor_public_id)
    .bind(&context.caller_ip)
    .bind(&context.user_agent)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Load an order with its items and full status history by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn get_with_details(
    pool: &PgPool,
    id: OrderId,
) -> Result<Option<OrderWithDetails>, RepositoryError> {
    let mut conn = pool.acquire().await?;
    let Some(order) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    drop(conn);

    load_details(pool, order).await.map(Some)
}

/// Load an order with its items and full status history by order number.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn get_with_details_by_number(
    pool: &PgPool,
    order_number: &str,
) -> Result<Option<OrderWithDetails>, RepositoryError> {
    let mut conn = pool.acquire().await?;
    let Some(order) = find_by_number(&mut *conn, order_number).await? else {
        return Ok(None);
    };
    drop(conn);

    load_details(pool, order).await.map(Some)
}

async fn load_details(pool: &PgPool, order: Order) -> Result<OrderWithDetails, RepositoryError> {
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, sku, name, quantity, unit_price, subtotal \
         FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order.id.as_i32())
    .fetch_all(pool)
    .await?;

    let event_rows = sqlx::query_as::<_, StatusEventRow>(
        "SELECT id, order_id, previous_status, new_status, note, \
                actor_public_id, caller_ip, user_agent, created_at \
         FROM order_status_events WHERE order_id = $1 \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(order.id.as_i32())
    .fetch_all(pool)
    .await?;

    let history = event_rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderWithDetails {
        order,
        items: item_rows.into_iter().map(Into::into).collect(),
        history,
    })
}

// =============================================================================
// Reporting queries
// =============================================================================

/// Count orders created today (database-server time).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_today(pool: &PgPool) -> Result<i64, RepositoryError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= date_trunc('day', NOW())")
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Cumulative revenue over settled statuses.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn settled_revenue(pool: &PgPool) -> Result<Decimal, RepositoryError> {
    let revenue: Decimal = sqlx::query_scalar(&format!(
        "SELECT COALESCE(SUM(total), 0) FROM orders WHERE status IN {SETTLED_STATUSES}"
    ))
    .fetch_one(pool)
    .await?;

    Ok(revenue)
}

/// Order counts grouped by lifecycle status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status")
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|(status, count)| {
            let status = status
                .parse()
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;
            Ok((status, count))
        })
        .collect()
}
