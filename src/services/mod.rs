//! Core services.
//!
//! - `codec`: SS58 and hex address conversions
//! - `signing`: claim signing payload
//! - `blockchain`: transport to a Substrate node
//! - `accounts`: the unified account manager

pub mod accounts;
pub mod blockchain;
pub mod codec;
pub mod signing;
