//! Unified error handling for the checkout pipeline.

use driftwood_core::OrderStatus;
use thiserror::Error;

use crate::db::RepositoryError;

/// Terminal failure surfaced by the checkout pipeline.
///
/// Every error inside a unit of work causes a full rollback, so callers can
/// treat any of these as "nothing was persisted" — except
/// [`CheckoutError::Collaborator`], which is raised strictly after commit:
/// the order exists and must not be reported as lost.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Email or tax id is already bound to a different customer.
    #[error("identity conflict: {0}")]
    IdentityConflict(String),

    /// Requested quantity exceeds available stock.
    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: i32,
        available: i32,
    },

    /// No order matches the given identifier.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The requested status change is not allowed by the lifecycle.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The request violates the caller contract (bad quantity, unknown SKU).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transaction could not commit. Safe to retry the whole checkout.
    #[error("storage failure: {0}")]
    Storage(#[from] RepositoryError),

    /// A post-commit collaborator call failed. The order is committed.
    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

impl CheckoutError {
    /// Stable machine-readable error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IdentityConflict(_) => "identity_conflict",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::OrderNotFound(_) => "order_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Storage(_) => "storage_failure",
            Self::Collaborator(_) => "collaborator_failure",
        }
    }

    /// Whether retrying the whole checkout is safe and useful.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Message safe to show an end user.
    ///
    /// Storage and collaborator failures never leak internal error text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "We could not complete your order. Please try again.".to_string(),
            Self::Collaborator(_) => {
                "Your order was placed, but we could not reach the payment provider. \
                 Please contact support with your order number."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            CheckoutError::IdentityConflict("x".to_string()).code(),
            "identity_conflict"
        );
        assert_eq!(
            CheckoutError::InsufficientStock {
                sku: "SKU-1".to_string(),
                requested: 5,
                available: 2,
            }
            .code(),
            "insufficient_stock"
        );
        assert_eq!(
            CheckoutError::OrderNotFound("DW-1".to_string()).code(),
            "order_not_found"
        );
        assert_eq!(
            CheckoutError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            }
            .code(),
            "invalid_transition"
        );
    }

    #[test]
    fn test_storage_message_is_redacted() {
        let err = CheckoutError::Storage(RepositoryError::DataCorruption(
            "secret internal detail".to_string(),
        ));
        assert!(!err.user_message().contains("secret internal detail"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_collaborator_message_points_at_support() {
        let err = CheckoutError::Collaborator("gateway timeout".to_string());
        assert!(!err.user_message().contains("gateway timeout"));
        assert!(err.user_message().contains("order was placed"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_insufficient_stock_display() {
        let err = CheckoutError::InsufficientStock {
            sku: "DW-CANDLE".to_string(),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for DW-CANDLE: requested 3, available 1"
        );
    }
}
