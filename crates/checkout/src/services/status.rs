//! The status historian: lifecycle transitions with an immutable trail.
//!
//! Every successful transition updates the order's status field and appends
//! exactly one history event; the two writes share a transaction, so the
//! event is never skipped when the status write lands.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use driftwood_core::{OrderId, OrderStatus};

use crate::db::{self, RepositoryError};
use crate::error::CheckoutError;
use crate::models::{Order, OrderStatusEvent, RequestContext};

/// Transition an order to `new_status`, appending one history event.
///
/// The state machine is enforced strictly: a move not allowed by
/// [`OrderStatus::can_transition_to`] fails with `InvalidTransition` and
/// writes nothing.
///
/// # Errors
///
/// Returns `OrderNotFound` if the id does not resolve, `InvalidTransition`
/// for an illegal move, `Storage` if the transaction fails.
#[tracing::instrument(skip(pool, note, context), fields(new_status = %new_status))]
pub async fn transition_order(
    pool: &PgPool,
    order_id: OrderId,
    new_status: OrderStatus,
    note: Option<&str>,
    actor_public_id: Option<Uuid>,
    context: &RequestContext,
) -> Result<OrderStatusEvent, CheckoutError> {
    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let order = db::orders::find_by_id(&mut *tx, order_id)
        .await?
        .ok_or_else(|| CheckoutError::OrderNotFound(order_id.to_string()))?;

    let event = apply_transition(&mut *tx, &order, new_status, note, actor_public_id, context).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    Ok(event)
}

/// Guard and perform the two transition writes on the caller's connection.
///
/// Shared by [`transition_order`] and the payment-notification path, which
/// resolves the order by number and layers a payment-status update into the
/// same transaction.
pub(crate) async fn apply_transition(
    conn: &mut PgConnection,
    order: &Order,
    new_status: OrderStatus,
    note: Option<&str>,
    actor_public_id: Option<Uuid>,
    context: &RequestContext,
) -> Result<OrderStatusEvent, CheckoutError> {
    if !order.status.can_transition_to(new_status) {
        return Err(CheckoutError::InvalidTransition {
            from: order.status,
            to: new_status,
        });
    }

    db::orders::set_status(conn, order.id, new_status).await?;

    let event = db::orders::append_status_event(
        conn,
        order.id,
        order.status,
        new_status,
        note,
        actor_public_id,
        context,
    )
    .await?;

    tracing::info!(
        order_number = %order.order_number,
        from = %order.status,
        to = %new_status,
        "order status transitioned"
    );

    Ok(event)
}
