//! Database operations for customer addresses.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use driftwood_core::{AddressId, CustomerId};

use super::RepositoryError;
use crate::models::{Address, CreateAddressInput};

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    customer_id: i32,
    postal_code: String,
    street: String,
    number: String,
    complement: Option<String>,
    district: String,
    city: String,
    region: String,
    purpose: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let purpose = row
            .purpose
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid purpose: {e}")))?;

        Ok(Self {
            id: AddressId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            postal_code: row.postal_code,
            street: row.street,
            number: row.number,
            complement: row.complement,
            district: row.district,
            city: row.city,
            region: row.region,
            purpose,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Append an address for a customer.
///
/// When `is_default` is requested, every prior non-deleted default of the
/// customer is demoted first, on the same connection, so no window exists
/// where two defaults are visible. Callers own the transaction scope.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn insert_address(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    input: &CreateAddressInput,
) -> Result<Address, RepositoryError> {
    if input.is_default {
        demote_defaults(conn, customer_id).await?;
    }

    let row = sqlx::query_as::<_, AddressRow>(
        "INSERT INTO addresses ( \
             customer_id, postal_code, street, number, complement, \
             district, city, region, purpose, is_default \
         ) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id, customer_id, postal_code, street, number, complement, \
                   district, city, region, purpose, is_default, created_at, updated_at",
    )
    .bind(customer_id.as_i32())
    .bind(&input.postal_code)
    .bind(&input.street)
    .bind(&input.number)
    .bind(&input.complement)
    .bind(&input.district)
    .bind(&input.city)
    .bind(&input.region)
    .bind(input.purpose.to_string())
    .bind(input.is_default)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

/// Demote every non-deleted default address of a customer.
async fn demote_defaults(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE addresses \
         SET is_default = FALSE, updated_at = NOW() \
         WHERE customer_id = $1 AND is_default AND deleted_at IS NULL",
    )
    .bind(customer_id.as_i32())
    .execute(conn)
    .await?;

    Ok(())
}
