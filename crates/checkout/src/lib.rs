//! Driftwood Checkout - the transactional order pipeline.
//!
//! This crate owns the only part of the store with real engineering stakes:
//! the sequence that, given a checkout submission, atomically reconciles a
//! customer identity, records a shipping address, reserves inventory, and
//! persists an order with line-item snapshots. Everything around it
//! (presentation, email, hosted payment pages) is a collaborator that calls
//! in or is called out to after commit.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`error`] - The [`error::CheckoutError`] taxonomy surfaced to callers
//! - [`models`] - Domain structs and input types
//! - [`db`] - `PostgreSQL` repositories (one module per table)
//! - [`services`] - The checkout coordinator, status historian, payment
//!   notifications, and the read-only reporting surface
//!
//! # Transaction discipline
//!
//! Write-path repository functions take `&mut PgConnection` so the service
//! layer decides the transaction scope. [`services::checkout::CheckoutService`]
//! runs the whole pipeline inside a single transaction; a failure at any step
//! rolls back every write made so far. Collaborator calls (payment link
//! generation) happen strictly after commit and can never unwind an order.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::CheckoutConfig;
pub use error::CheckoutError;
