//! Database operations for customers.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use driftwood_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::{CreateCustomerInput, Customer};

/// Unique partial index on non-deleted emails (see migrations).
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "customers_email_active_idx";
/// Unique partial index on non-deleted tax ids (see migrations).
pub const TAX_ID_UNIQUE_CONSTRAINT: &str = "customers_tax_id_active_idx";

const SELECT_COLUMNS: &str = "id, public_id, legal_name, email, tax_id, phone, status, \
                              failed_logins, created_at, updated_at";

/// Internal row type for customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    public_id: Uuid,
    legal_name: String,
    email: String,
    tax_id: String,
    phone: Option<String>,
    status: String,
    failed_logins: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid status: {e}")))?;

        Ok(Self {
            id: CustomerId::new(row.id),
            public_id: row.public_id,
            legal_name: row.legal_name,
            email,
            tax_id: row.tax_id,
            phone: row.phone,
            status,
            failed_logins: row.failed_logins,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Find a non-deleted customer by normalized email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_email(
    conn: &mut PgConnection,
    email: &Email,
) -> Result<Option<Customer>, RepositoryError> {
    let row = sqlx::query_as::<_, CustomerRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM customers WHERE email = $1 AND deleted_at IS NULL"
    ))
    .bind(email.as_str())
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Find a non-deleted customer by tax id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_tax_id(
    conn: &mut PgConnection,
    tax_id: &str,
) -> Result<Option<Customer>, RepositoryError> {
    let row = sqlx::query_as::<_, CustomerRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM customers WHERE tax_id = $1 AND deleted_at IS NULL"
    ))
    .bind(tax_id)
    .fetch_optional(conn)
    .await?;

    row.map(TryInto::try_into).transpose()
}

/// Insert a new customer with a fresh public id.
///
/// The partial unique indexes on `email` and `tax_id` are the authoritative
/// uniqueness guard; a violation raced past the caller's lookup surfaces as
/// `RepositoryError::Conflict`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` when email or tax id is already
/// bound to a non-deleted customer, `RepositoryError::Database` otherwise.
pub async fn insert_customer(
    conn: &mut PgConnection,
    input: &CreateCustomerInput,
) -> Result<Customer, RepositoryError> {
    let row = sqlx::query_as::<_, CustomerRow>(&format!(
        "INSERT INTO customers (public_id, legal_name, email, tax_id, credential_hash, phone, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'active') \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&input.legal_name)
    .bind(input.email.as_str())
    .bind(&input.tax_id)
    .bind(&input.credential_hash)
    .bind(&input.phone)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            match db_err.constraint() {
                Some(EMAIL_UNIQUE_CONSTRAINT) => {
                    return RepositoryError::Conflict(
                        "email already bound to another customer".to_string(),
                    );
                }
                Some(TAX_ID_UNIQUE_CONSTRAINT) => {
                    return RepositoryError::Conflict(
                        "tax id already bound to another customer".to_string(),
                    );
                }
                _ => {}
            }
        }
        RepositoryError::Database(e)
    })?;

    row.try_into()
}

/// Count non-deleted customers.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_customers(pool: &PgPool) -> Result<i64, RepositoryError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    Ok(count)
}
