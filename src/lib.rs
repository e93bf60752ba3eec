//! Unified Substrate/EVM accounts for Selendra.
//!
//! Every Selendra account exists in two address spaces: a 32-byte Substrate account id,
//! written in SS58, and a 20-byte EVM address, written in hex. This crate provides:
//!
//! - stateless conversion between the two text forms ([`services::codec`]) and a value
//!   object carrying both ([`UnifiedAddress`]);
//! - the signing payload an EVM wallet signs to prove it controls an address being
//!   claimed ([`services::signing`]);
//! - [`UnifiedAccountManager`], which aggregates balances across both sides, reads the
//!   claimed mapping from chain storage and submits the claim extrinsics through a
//!   [`SubstrateTransport`].
//!
//! Derived addresses (padding and truncation) are computed locally and are not proof of
//! common ownership. Only a [`ClaimedMapping`] read from chain is authoritative.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use selendra_unified_accounts::{NetworkConfig, SubxtTransport, UnifiedAccountManager};
//! use subxt::{tx::Signer, SubstrateConfig};
//!
//! async fn claim<S>(signer: &S) -> Result<(), Box<dyn std::error::Error>>
//! where
//! 	S: Signer<SubstrateConfig> + Send + Sync,
//! {
//! 	let network = NetworkConfig::selendra_mainnet().with_env_overrides()?;
//! 	let transport = SubxtTransport::<S>::new(&network).await?;
//! 	let manager = UnifiedAccountManager::new(Arc::new(transport), &network);
//!
//! 	let balance = manager
//! 		.get_unified_balance("0x1234567890abcdef1234567890abcdef12345678")
//! 		.await?;
//! 	println!("total: {}", balance.total);
//!
//! 	let outcome = manager.claim_default_evm_address(signer, None).await?;
//! 	println!("claimed {} in {}", outcome.evm_address, outcome.block_hash);
//! 	Ok(())
//! }
//! ```

pub mod models;
pub mod services;
pub mod utils;

pub use models::{
	AddressFormat, AddressKind, AddressPair, AddressType, AddressValidation, ClaimOutcome,
	ClaimedMapping, ConfigError, ConfigLoader, DerivedEvmAddress, DerivedSubstrateAddress,
	EvmAddress, NetworkConfig, SubstrateAccountId, TargetFormat, UnifiedAccountInfo,
	UnifiedAddress, UnifiedBalance,
};
pub use services::{
	accounts::{AccountError, UnifiedAccountManager},
	blockchain::{BlockChainError, SubstrateTransport, SubxtTransport},
};
