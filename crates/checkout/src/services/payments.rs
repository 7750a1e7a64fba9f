//! Payment-notifier integration.
//!
//! The notifier is a trusted external collaborator: signature verification
//! happens upstream, and what arrives here is an order number plus a
//! settlement outcome. A notification drives the status historian alone —
//! it is independent of, and later than, the checkout transaction.

use serde::Deserialize;
use sqlx::PgPool;

use driftwood_core::{OrderStatus, PaymentStatus};

use crate::db::{self, RepositoryError};
use crate::error::CheckoutError;
use crate::models::{OrderStatusEvent, RequestContext};
use crate::services::status::apply_transition;

/// Settlement outcome reported by the payment notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Payment settled successfully.
    Settled,
    /// Payment attempt failed.
    Failed,
    /// Payment was voided before settlement.
    Voided,
}

impl std::fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
            Self::Voided => write!(f, "voided"),
        }
    }
}

/// A notification from the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    /// Order number the payment belongs to.
    pub order_number: String,
    /// What happened to the payment.
    pub outcome: PaymentOutcome,
    /// Provider-side transaction reference.
    pub external_ref: String,
}

/// Apply a payment notification to the referenced order.
///
/// Settled payments move the order to `paid`; failed or voided payments
/// cancel it. The lifecycle transition, its history event, and the payment
/// status update share one transaction.
///
/// # Errors
///
/// Returns `OrderNotFound` if the order number does not resolve,
/// `InvalidTransition` if the order already left the payable states,
/// `Storage` if the transaction fails.
#[tracing::instrument(skip(pool), fields(order_number = %notification.order_number, outcome = %notification.outcome))]
pub async fn apply_payment_notification(
    pool: &PgPool,
    notification: &PaymentNotification,
) -> Result<OrderStatusEvent, CheckoutError> {
    let (new_status, payment_status) = match notification.outcome {
        PaymentOutcome::Settled => (OrderStatus::Paid, PaymentStatus::Paid),
        PaymentOutcome::Failed | PaymentOutcome::Voided => {
            (OrderStatus::Cancelled, PaymentStatus::Failed)
        }
    };

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let order = db::orders::find_by_number(&mut *tx, &notification.order_number)
        .await?
        .ok_or_else(|| CheckoutError::OrderNotFound(notification.order_number.clone()))?;

    let note = format!(
        "payment notification {}: {}",
        notification.external_ref, notification.outcome
    );
    let event = apply_transition(
        &mut *tx,
        &order,
        new_status,
        Some(&note),
        None,
        &RequestContext::system(),
    )
    .await?;

    db::orders::set_payment_status(&mut *tx, order.id, payment_status).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    Ok(event)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_deserializes_snake_case() {
        let outcome: PaymentOutcome = serde_json::from_str("\"settled\"").unwrap();
        assert_eq!(outcome, PaymentOutcome::Settled);
        let outcome: PaymentOutcome = serde_json::from_str("\"voided\"").unwrap();
        assert_eq!(outcome, PaymentOutcome::Voided);
        assert!(serde_json::from_str::<PaymentOutcome>("\"unknown\"").is_err());
    }

    #[test]
    fn test_notification_shape() {
        let notification: PaymentNotification = serde_json::from_str(
            r#"{"order_number": "DW-20260806-0001", "outcome": "failed", "external_ref": "tx_99"}"#,
        )
        .unwrap();
        assert_eq!(notification.outcome, PaymentOutcome::Failed);
        assert_eq!(notification.external_ref, "tx_99");
    }
}
