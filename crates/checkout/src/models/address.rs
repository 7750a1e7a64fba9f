//! Address domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use driftwood_core::{AddressId, AddressPurpose, CustomerId};

/// A shipping or billing address owned by exactly one customer.
///
/// At most one non-deleted address per customer carries `is_default = true`;
/// the recorder demotes prior defaults in the same unit of work that inserts
/// a new default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Postal code.
    pub postal_code: String,
    /// Street name.
    pub street: String,
    /// Street number.
    pub number: String,
    /// Apartment, suite, floor.
    pub complement: Option<String>,
    /// District or neighborhood.
    pub district: String,
    /// City.
    pub city: String,
    /// State or region.
    pub region: String,
    /// What the address is used for.
    pub purpose: AddressPurpose,
    /// Whether this is the customer's default address.
    pub is_default: bool,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
    /// When the address was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for appending an address to a customer.
#[derive(Debug, Clone)]
pub struct CreateAddressInput {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub region: String,
    pub purpose: AddressPurpose,
    pub is_default: bool,
}
