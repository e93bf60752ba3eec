//! Domain models and data structures.
//!
//! - `address`: Substrate account ids, EVM addresses and their unified form
//! - `balance`: balances aggregated across both sides of an account
//! - `claim`: claim extrinsics, transaction statuses and storage lookups
//! - `config`: network configuration and its loader

mod address;
mod balance;
mod claim;
mod config;

pub use address::{
	AddressFormat, AddressKind, AddressPair, AddressType, AddressValidation, ClaimedMapping,
	DerivedEvmAddress, DerivedSubstrateAddress, EvmAddress, SubstrateAccountId, TargetFormat,
	UnifiedAddress, GENERIC_SUBSTRATE_SS58_PREFIX, SELENDRA_SS58_PREFIX,
};
pub use balance::{SubstrateBalance, UnifiedAccountInfo, UnifiedBalance};
pub use claim::{
	ChainEvent, ClaimCall, ClaimFinality, ClaimOutcome, DispatchErrorDetails,
	EventField, StorageLookup, SubstrateAccountData, TxInclusion, TxStatus, EVM_SIGNATURE_LEN,
};
pub use config::{
	ConfigError, ConfigLoader, NetworkConfig, NetworkConfigFile, EVM_CHAIN_ID_ENV, RPC_URL_ENV,
	SS58_PREFIX_ENV,
};
