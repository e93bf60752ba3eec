//! Unified account management.
//!
//! [`UnifiedAccountManager`] is the entry point for applications: it parses and
//! converts addresses, aggregates balances across both sides of an account, looks up
//! claimed mappings and submits claims.

mod error;
mod manager;

pub use error::AccountError;
pub use manager::UnifiedAccountManager;
