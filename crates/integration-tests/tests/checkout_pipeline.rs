//! End-to-end tests for the checkout pipeline.
//!
//! These tests use a shared `PostgreSQL` container; each one gets truncated
//! tables and runs serially.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serial_test::serial;

use driftwood_checkout::CheckoutError;
use driftwood_checkout::models::RequestContext;
use driftwood_checkout::services::{CheckoutService, PaymentLinkProvider};
use driftwood_integration_tests::{
    checkout_request, count_rows, seed_product, stock_of, test_pool,
};

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

#[tokio::test]
#[serial]
async fn successful_checkout_creates_one_of_everything() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);
    let request = checkout_request("ana@example.com", "111", "DW-CANDLE", 2);

    let receipt = service
        .place_order(&request, &RequestContext::system())
        .await
        .unwrap();

    assert_eq!(receipt.total, dec("200.00"));
    assert!(receipt.order_number.starts_with("DW-"));

    assert_eq!(count_rows(&pool, "customers").await, 1);
    assert_eq!(count_rows(&pool, "orders").await, 1);
    assert_eq!(count_rows(&pool, "order_items").await, 1);
    assert_eq!(stock_of(&pool, "DW-CANDLE").await, 8);

    // Customer creation + order creation are both audited
    assert_eq!(count_rows(&pool, "audit_entries").await, 2);
}

#[tokio::test]
#[serial]
async fn checkout_reuses_matching_customer() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);
    let request = checkout_request("ana@example.com", "111", "DW-CANDLE", 1);

    service
        .place_order(&request, &RequestContext::system())
        .await
        .unwrap();
    service
        .place_order(&request, &RequestContext::system())
        .await
        .unwrap();

    assert_eq!(count_rows(&pool, "customers").await, 1);
    assert_eq!(count_rows(&pool, "orders").await, 2);
}

#[tokio::test]
#[serial]
async fn email_normalization_matches_existing_customer() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);

    service
        .place_order(
            &checkout_request("ana@example.com", "111", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap();
    service
        .place_order(
            &checkout_request("  Ana@Example.COM ", "111", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap();

    assert_eq!(count_rows(&pool, "customers").await, 1);
}

#[tokio::test]
#[serial]
async fn identity_conflict_rolls_back_everything() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);

    service
        .place_order(
            &checkout_request("ana@example.com", "111", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap();

    let customers_before = count_rows(&pool, "customers").await;
    let addresses_before = count_rows(&pool, "addresses").await;
    let audit_before = count_rows(&pool, "audit_entries").await;

    // Same email, different tax id
    let err = service
        .place_order(
            &checkout_request("ana@example.com", "222", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::IdentityConflict(_)));
    assert_eq!(err.code(), "identity_conflict");

    // Same tax id, different email
    let err = service
        .place_order(
            &checkout_request("other@example.com", "111", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::IdentityConflict(_)));

    // No new rows of any kind, stock untouched by the failed attempts
    assert_eq!(count_rows(&pool, "customers").await, customers_before);
    assert_eq!(count_rows(&pool, "addresses").await, addresses_before);
    assert_eq!(count_rows(&pool, "audit_entries").await, audit_before);
    assert_eq!(count_rows(&pool, "orders").await, 1);
    assert_eq!(stock_of(&pool, "DW-CANDLE").await, 9);
}

#[tokio::test]
#[serial]
async fn insufficient_stock_leaves_no_trace() {
    let pool = test_pool().await;
    let product = seed_product(&pool, "DW-CANDLE", "100.00", 1).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);

    let err = service
        .place_order(
            &checkout_request("ana@example.com", "111", "DW-CANDLE", 3),
            &RequestContext::system(),
        )
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 3);
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The whole unit of work rolled back: no order, no customer, stock intact
    assert_eq!(count_rows(&pool, "orders").await, 0);
    assert_eq!(count_rows(&pool, "customers").await, 0);
    assert_eq!(
        driftwood_checkout::db::products::stock_of(&pool, product.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
#[serial]
async fn zero_quantity_is_rejected() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);
    let err = service
        .place_order(
            &checkout_request("ana@example.com", "111", "DW-CANDLE", 0),
            &RequestContext::system(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InvalidRequest(_)));
    assert_eq!(count_rows(&pool, "orders").await, 0);
}

#[tokio::test]
#[serial]
async fn new_default_address_demotes_prior_default() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO);
    let request = checkout_request("ana@example.com", "111", "DW-CANDLE", 1);

    // Each checkout records the shipping address as the new default
    service
        .place_order(&request, &RequestContext::system())
        .await
        .unwrap();
    service
        .place_order(&request, &RequestContext::system())
        .await
        .unwrap();

    assert_eq!(count_rows(&pool, "addresses").await, 2);

    let defaults: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM addresses WHERE is_default AND deleted_at IS NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(defaults, 1);
}

#[tokio::test]
#[serial]
async fn concurrent_checkouts_create_exactly_one_customer() {
    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 100).await;

    let service = Arc::new(CheckoutService::new(pool.clone(), "DW", Decimal::ZERO));

    let a = tokio::spawn({
        let service = Arc::clone(&service);
        async move {
            service
                .place_order(
                    &checkout_request("race@example.com", "999", "DW-CANDLE", 1),
                    &RequestContext::system(),
                )
                .await
        }
    });
    let b = tokio::spawn({
        let service = Arc::clone(&service);
        async move {
            service
                .place_order(
                    &checkout_request("race@example.com", "999", "DW-CANDLE", 1),
                    &RequestContext::system(),
                )
                .await
        }
    });

    let (result_a, result_b) = (a.await.unwrap(), b.await.unwrap());

    // Each attempt either succeeded or lost the identity race; the unique
    // index guarantees a single customer row either way.
    for result in [&result_a, &result_b] {
        match result {
            Ok(_) | Err(CheckoutError::IdentityConflict(_)) => {}
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }
    assert!(result_a.is_ok() || result_b.is_ok());
    assert_eq!(count_rows(&pool, "customers").await, 1);
}

#[tokio::test]
#[serial]
async fn collaborator_failure_does_not_lose_the_order() {
    struct FlakyProvider;

    #[async_trait::async_trait]
    impl PaymentLinkProvider for FlakyProvider {
        async fn create_link(&self, _order_number: &str, _total: Decimal) -> Result<String, String> {
            Err("gateway timeout".to_string())
        }
    }

    let pool = test_pool().await;
    seed_product(&pool, "DW-CANDLE", "100.00", 10).await;

    let service = CheckoutService::new(pool.clone(), "DW", Decimal::ZERO)
        .with_payment_links(Arc::new(FlakyProvider));

    let receipt = service
        .place_order(
            &checkout_request("ana@example.com", "111", "DW-CANDLE", 1),
            &RequestContext::system(),
        )
        .await
        .unwrap();

    // Degraded success: the order committed, the warning is user-safe
    assert!(receipt.payment_link.is_none());
    let warning = receipt.collaborator_warning.unwrap();
    assert!(!warning.contains("gateway timeout"));
    assert_eq!(count_rows(&pool, "orders").await, 1);
}
