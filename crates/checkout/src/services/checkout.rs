//! The checkout coordinator: one atomic unit of work per submission.
//!
//! A submission drives identity resolution, address recording, stock
//! reservation, order assembly, and audit logging inside a single
//! transaction. Collaborator calls (payment link generation) happen strictly
//! after commit; their failure degrades the receipt but never unwinds the
//! order.

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{PgConnection, PgPool};

use driftwood_core::{AddressPurpose, AuditAction, Email};

use crate::config::CheckoutConfig;
use crate::db::{self, RepositoryError};
use crate::error::CheckoutError;
use crate::models::{
    CreateAddressInput, CreateCustomerInput, CreateOrderInput, CreateOrderItemInput, Customer,
    RecordAuditInput, RequestContext,
};

/// Collaborator seam for hosted-checkout link generation.
///
/// Implementations call the payment provider; the pipeline only cares that
/// the call happens after commit and that failure is survivable.
#[async_trait::async_trait]
pub trait PaymentLinkProvider: Send + Sync {
    /// Create a hosted payment link for a committed order.
    ///
    /// # Errors
    ///
    /// Returns the provider's failure message; the order is already durable.
    async fn create_link(&self, order_number: &str, total: Decimal) -> Result<String, String>;
}

/// A checkout submission, validated upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub email: String,
    pub tax_id: String,
    pub phone: Option<String>,
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub region: String,
    pub product_sku: String,
    pub quantity: i32,
    pub shipping: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub payment_method: Option<String>,
}

/// What a successful checkout returns.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    /// Human-readable order number.
    pub order_number: String,
    /// Amount charged.
    pub total: Decimal,
    /// Hosted payment link, when the provider call succeeded.
    pub payment_link: Option<String>,
    /// Set when the order committed but a collaborator call failed.
    pub collaborator_warning: Option<String>,
}

/// The transaction coordinator for checkout submissions.
pub struct CheckoutService {
    pool: PgPool,
    order_prefix: String,
    default_shipping: Decimal,
    payment_links: Option<Arc<dyn PaymentLinkProvider>>,
}

impl CheckoutService {
    /// Create a checkout service over an owned pool handle.
    #[must_use]
    pub fn new(pool: PgPool, order_prefix: impl Into<String>, default_shipping: Decimal) -> Self {
        Self {
            pool,
            order_prefix: order_prefix.into(),
            default_shipping,
            payment_links: None,
        }
    }

    /// Build a service from loaded configuration.
    #[must_use]
    pub fn from_config(pool: PgPool, config: &CheckoutConfig) -> Self {
        Self::new(pool, config.order_prefix.clone(), config.default_shipping)
    }

    /// Attach a payment-link collaborator, called after commit.
    #[must_use]
    pub fn with_payment_links(mut self, provider: Arc<dyn PaymentLinkProvider>) -> Self {
        self.payment_links = Some(provider);
        self
    }

    /// Run one checkout as a single atomic unit of work.
    ///
    /// Either every write (customer creation or reuse, address insert, order
    /// and item inserts, stock decrement, audit entries) commits, or none
    /// does.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; every variant except `Collaborator` means
    /// nothing was persisted.
    #[tracing::instrument(skip(self, request, context), fields(sku = %request.product_sku, quantity = request.quantity))]
    pub async fn place_order(
        &self,
        request: &CheckoutRequest,
        context: &RequestContext,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if request.quantity <= 0 {
            return Err(CheckoutError::InvalidRequest(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }

        let email = Email::parse(&request.email)
            .map_err(|e| CheckoutError::InvalidRequest(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let customer = resolve_customer(&mut *tx, request, &email, context).await?;

        let address = db::addresses::insert_address(
            &mut *tx,
            customer.id,
            &CreateAddressInput {
                postal_code: request.postal_code.clone(),
                street: request.street.clone(),
                number: request.number.clone(),
                complement: request.complement.clone(),
                district: request.district.clone(),
                city: request.city.clone(),
                region: request.region.clone(),
                purpose: AddressPurpose::Delivery,
                is_default: true,
            },
        )
        .await?;

        let product = db::products::find_active_by_sku(&mut *tx, &request.product_sku)
            .await?
            .ok_or_else(|| {
                CheckoutError::InvalidRequest(format!(
                    "unknown or inactive product: {}",
                    request.product_sku
                ))
            })?;

        // Locks the product row until commit; concurrent checkouts for the
        // same product serialize here.
        let stock = db::products::stock_for_update(&mut *tx, product.id).await?;
        if stock < request.quantity {
            return Err(CheckoutError::InsufficientStock {
                sku: product.sku,
                requested: request.quantity,
                available: stock,
            });
        }

        let shipping = request.shipping.unwrap_or(self.default_shipping);
        let discount = request.discount.unwrap_or(Decimal::ZERO);
        let (subtotal, total) =
            compute_totals(product.unit_price, request.quantity, shipping, discount);
        if total < Decimal::ZERO {
            return Err(CheckoutError::InvalidRequest(
                "discount exceeds order value".to_string(),
            ));
        }

        let order_number = generate_order_number(&self.order_prefix);

        let order = db::orders::insert_order(
            &mut *tx,
            &CreateOrderInput {
                order_number,
                customer_id: customer.id,
                address_id: address.id,
                subtotal,
                shipping,
                discount,
                total,
                payment_method: request.payment_method.clone(),
            },
        )
        .await?;

        db::orders::insert_items(
            &mut *tx,
            order.id,
            &[CreateOrderItemInput {
                sku: product.sku.clone(),
                name: product.name.clone(),
                quantity: request.quantity,
                unit_price: product.unit_price,
                subtotal,
            }],
        )
        .await?;

        db::products::decrement_stock(&mut *tx, product.id, request.quantity).await?;

        db::audit::record(
            &mut *tx,
            &RecordAuditInput {
                table_name: "orders".to_string(),
                record_id: order.order_number.clone(),
                action: AuditAction::Insert,
                before: None,
                after: Some(serde_json::json!({
                    "order_number": order.order_number,
                    "customer": customer.public_id,
                    "sku": product.sku,
                    "quantity": request.quantity,
                    "total": order.total,
                })),
                actor: "system".to_string(),
                context: context.clone(),
            },
        )
        .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(order_number = %order.order_number, total = %order.total, "order placed");

        let mut receipt = CheckoutReceipt {
            order_number: order.order_number,
            total: order.total,
            payment_link: None,
            collaborator_warning: None,
        };

        // Post-commit: the order is durable no matter what happens here.
        if let Some(provider) = &self.payment_links {
            match provider.create_link(&receipt.order_number, receipt.total).await {
                Ok(link) => receipt.payment_link = Some(link),
                Err(reason) => {
                    tracing::warn!(
                        order_number = %receipt.order_number,
                        %reason,
                        "payment link generation failed after commit"
                    );
                    receipt.collaborator_warning =
                        Some(CheckoutError::Collaborator(reason).user_message());
                }
            }
        }

        Ok(receipt)
    }
}

/// Map an (email, tax id) pair to exactly one customer, creating one when
/// neither field is known.
///
/// Runs on the checkout transaction. The partial unique indexes on email and
/// tax id are the authoritative guard against two concurrent checkouts both
/// passing the lookups; a violation raced past them comes back as `Conflict`
/// and is converted to `IdentityConflict` here.
async fn resolve_customer(
    conn: &mut PgConnection,
    request: &CheckoutRequest,
    email: &Email,
    context: &RequestContext,
) -> Result<Customer, CheckoutError> {
    if let Some(existing) = db::customers::find_by_email(conn, email).await? {
        if existing.tax_id != request.tax_id {
            return Err(CheckoutError::IdentityConflict(
                "email is bound to a different tax id".to_string(),
            ));
        }
        return Ok(existing);
    }

    if db::customers::find_by_tax_id(conn, &request.tax_id)
        .await?
        .is_some()
    {
        return Err(CheckoutError::IdentityConflict(
            "tax id is bound to a different email".to_string(),
        ));
    }

    let input = CreateCustomerInput {
        legal_name: request.customer_name.clone(),
        email: email.clone(),
        tax_id: request.tax_id.clone(),
        phone: request.phone.clone(),
        credential_hash: provisional_credential_hash(),
    };

    let customer = match db::customers::insert_customer(conn, &input).await {
        Ok(customer) => customer,
        Err(RepositoryError::Conflict(message)) => {
            return Err(CheckoutError::IdentityConflict(message));
        }
        Err(e) => return Err(e.into()),
    };

    db::audit::record(
        conn,
        &RecordAuditInput {
            table_name: "customers".to_string(),
            record_id: customer.public_id.to_string(),
            action: AuditAction::Insert,
            before: None,
            after: Some(serde_json::json!({
                "public_id": customer.public_id,
                "email": customer.email,
                "tax_id": customer.tax_id,
            })),
            actor: "system".to_string(),
            context: context.clone(),
        },
    )
    .await?;

    Ok(customer)
}

/// `subtotal = unit_price * quantity`; `total = subtotal + shipping - discount`.
fn compute_totals(
    unit_price: Decimal,
    quantity: i32,
    shipping: Decimal,
    discount: Decimal,
) -> (Decimal, Decimal) {
    let subtotal = unit_price * Decimal::from(quantity);
    let total = subtotal + shipping - discount;
    (subtotal, total)
}

/// Generate a human-readable order number: prefix, compact date, random
/// 4-digit suffix (e.g., "DW-20260806-4821").
///
/// Advisory/display field only; the UNIQUE index on the column is a
/// tripwire, not a guarantee, and a collision surfaces as a retryable
/// storage failure.
fn generate_order_number(prefix: &str) -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("{prefix}-{date}-{suffix:04}")
}

/// Random provisional credential, hashed for storage.
///
/// Real authentication lives outside this pipeline; checkout-created
/// accounts get an unguessable placeholder until the customer claims them.
fn provisional_credential_hash() -> String {
    let token: [u8; 32] = rand::rng().random();
    hex::encode(Sha256::digest(token))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_compute_totals_no_adjustments() {
        let (subtotal, total) = compute_totals(dec("100.00"), 2, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(subtotal, dec("200.00"));
        assert_eq!(total, dec("200.00"));
    }

    #[test]
    fn test_compute_totals_with_shipping_and_discount() {
        let (subtotal, total) = compute_totals(dec("49.90"), 3, dec("12.50"), dec("10.00"));
        assert_eq!(subtotal, dec("149.70"));
        assert_eq!(total, dec("152.20"));
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number("DW");
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "DW");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_provisional_credential_is_hashed_and_random() {
        let a = provisional_credential_hash();
        let b = provisional_credential_hash();
        // SHA-256 hex digests
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
