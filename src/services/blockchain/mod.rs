//! Blockchain client interfaces and implementations.
//!
//! Provides the [`SubstrateTransport`] trait through which the account manager reads
//! chain storage and submits claims, and a [`SubxtTransport`] implementing it.

mod clients;
mod error;
mod transport;

pub use clients::SubxtTransport;
pub use error::BlockChainError;
pub use transport::{SubstrateTransport, TxStatusStream};
