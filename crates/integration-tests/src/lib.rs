//! Test harness for Driftwood integration tests.
//!
//! Starts one shared `PostgreSQL` container for the whole test binary, runs
//! the checkout migrations once, and hands each test a fresh pool over
//! truncated tables. Tests that share tables must run serially (the test
//! files use `serial_test` for this).

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use driftwood_checkout::db;
use driftwood_checkout::models::{Product, SeedProductInput};
use driftwood_checkout::services::CheckoutRequest;

/// Shared container info - container stays alive for all tests.
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container.
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{host}:{port}/postgres");

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            db::MIGRATOR.run(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables.
pub async fn test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query(
        "TRUNCATE TABLE customers, addresses, products, orders, \
         order_items, order_status_events, audit_entries \
         RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

/// Seed one product and return it.
pub async fn seed_product(pool: &PgPool, sku: &str, unit_price: &str, stock: i32) -> Product {
    let mut conn = pool.acquire().await.unwrap();
    db::products::insert_product(
        &mut *conn,
        &SeedProductInput {
            sku: sku.to_string(),
            name: format!("Test product {sku}"),
            unit_price: unit_price.parse::<Decimal>().unwrap(),
            stock,
            active: true,
            specification: Some(serde_json::json!({"material": "driftwood"})),
        },
    )
    .await
    .unwrap()
}

/// A well-formed checkout request for the given identity and product.
#[must_use]
pub fn checkout_request(email: &str, tax_id: &str, sku: &str, quantity: i32) -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Ana Souza".to_string(),
        email: email.to_string(),
        tax_id: tax_id.to_string(),
        phone: Some("+55 11 99999-0000".to_string()),
        postal_code: "01310-100".to_string(),
        street: "Avenida Paulista".to_string(),
        number: "1000".to_string(),
        complement: None,
        district: "Bela Vista".to_string(),
        city: "São Paulo".to_string(),
        region: "SP".to_string(),
        product_sku: sku.to_string(),
        quantity,
        shipping: None,
        discount: None,
        payment_method: Some("hosted_checkout".to_string()),
    }
}

/// Count rows in a table.
pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Current stock for a SKU.
pub async fn stock_of(pool: &PgPool, sku: &str) -> i32 {
    sqlx::query_scalar("SELECT stock FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_one(pool)
        .await
        .unwrap()
}
