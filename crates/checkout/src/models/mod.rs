//! Domain models for the checkout pipeline.

pub mod address;
pub mod audit;
pub mod customer;
pub mod order;
pub mod product;

use serde::{Deserialize, Serialize};

pub use address::{Address, CreateAddressInput};
pub use audit::{AuditEntry, RecordAuditInput};
pub use customer::{CreateCustomerInput, Customer};
pub use order::{
    CreateOrderInput, CreateOrderItemInput, Order, OrderItem, OrderStatusEvent, OrderWithDetails,
};
pub use product::{Product, SeedProductInput};

/// Where a request came from, threaded into status events and audit entries.
///
/// Both fields are optional: system-initiated work (seeding, webhooks from
/// trusted notifiers) carries no caller context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller IP address, if known.
    pub caller_ip: Option<String>,
    /// Caller user agent, if known.
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context for system-initiated mutations.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            caller_ip: None,
            user_agent: None,
        }
    }
}
