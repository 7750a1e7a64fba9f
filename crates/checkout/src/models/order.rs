//! Order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use driftwood_core::{
    AddressId, CustomerId, OrderId, OrderItemId, OrderStatus, PaymentStatus, StatusEventId,
};

/// An order header.
///
/// Orders are never physically deleted. `order_number` is a human-readable
/// advisory field; `id` is the real key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Human-readable order number (e.g., "DW-20260806-4821").
    pub order_number: String,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Delivery address.
    pub address_id: AddressId,
    /// Sum of line-item subtotals.
    pub subtotal: Decimal,
    /// Shipping charge.
    pub shipping: Decimal,
    /// Discount applied.
    pub discount: Decimal,
    /// subtotal + shipping - discount.
    pub total: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment method, if chosen.
    pub payment_method: Option<String>,
    /// Payment settlement status.
    pub payment_status: PaymentStatus,
    /// Carrier tracking code, once shipped.
    pub tracking_code: Option<String>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A line-item snapshot, frozen at purchase time.
///
/// Decoupled from live product state so historical orders stay accurate
/// when prices change later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique item ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// SKU at time of purchase.
    pub sku: String,
    /// Product name at time of purchase.
    pub name: String,
    /// Units ordered. Always positive.
    pub quantity: i32,
    /// Unit price at time of purchase.
    pub unit_price: Decimal,
    /// unit_price * quantity.
    pub subtotal: Decimal,
}

/// One recorded status transition. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    /// Unique event ID.
    pub id: StatusEventId,
    /// Order this event belongs to.
    pub order_id: OrderId,
    /// Status before the transition.
    pub previous_status: OrderStatus,
    /// Status after the transition.
    pub new_status: OrderStatus,
    /// Free-text note.
    pub note: Option<String>,
    /// Public id of the responsible actor; `None` means system-initiated.
    pub actor_public_id: Option<Uuid>,
    /// Caller IP captured from the request, if any.
    pub caller_ip: Option<String>,
    /// Caller user agent captured from the request, if any.
    pub user_agent: Option<String>,
    /// When the transition happened.
    pub created_at: DateTime<Utc>,
}

/// An order with its items and full status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithDetails {
    /// The order header.
    pub order: Order,
    /// Line-item snapshots.
    pub items: Vec<OrderItem>,
    /// Status history, ordered by creation time ascending.
    pub history: Vec<OrderStatusEvent>,
}

/// Input for inserting an order header.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub order_number: String,
    pub customer_id: CustomerId,
    pub address_id: AddressId,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: Option<String>,
}

/// Input for inserting a line-item snapshot.
#[derive(Debug, Clone)]
pub struct CreateOrderItemInput {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
