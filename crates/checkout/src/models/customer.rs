//! Customer domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use driftwood_core::{AccountStatus, CustomerId, Email};

/// A store customer.
///
/// `email` and `tax_id` are each unique among non-deleted customers; the
/// identity resolver treats them as a pair that must match an existing
/// record exactly or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Opaque identifier safe to expose outside the store.
    pub public_id: Uuid,
    /// Legal name as submitted at checkout.
    pub legal_name: String,
    /// Normalized email address.
    pub email: Email,
    /// Tax identifier.
    pub tax_id: String,
    /// Phone number, if provided.
    pub phone: Option<String>,
    /// Account status.
    pub status: AccountStatus,
    /// Consecutive failed login attempts.
    pub failed_logins: i32,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerInput {
    /// Legal name.
    pub legal_name: String,
    /// Normalized email address.
    pub email: Email,
    /// Tax identifier.
    pub tax_id: String,
    /// Phone number, if provided.
    pub phone: Option<String>,
    /// Hash of the provisional credential.
    pub credential_hash: String,
}
