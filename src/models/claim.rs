//! Claim extrinsic, transaction status and storage lookup data structures.
//!
//! These are the neutral shapes exchanged with a
//! [`SubstrateTransport`](crate::services::blockchain::SubstrateTransport). Chain
//! specific values are converted into them at the transport boundary.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::models::{ClaimedMapping, EvmAddress};

/// Length of an EVM secp256k1 signature (r, s, v)
pub const EVM_SIGNATURE_LEN: usize = 65;

/// Balances stored in `System.Account` for one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubstrateAccountData {
	pub free: U256,
	pub reserved: U256,
	pub frozen: U256,
}

/// Result of a storage read that distinguishes "absent" from "not deployed"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLookup<T> {
	Found(T),
	NotFound,
	PalletUnavailable,
}

impl<T> StorageLookup<T> {
	/// Collapses both absent states into `None`
	pub fn found(self) -> Option<T> {
		match self {
			Self::Found(value) => Some(value),
			Self::NotFound | Self::PalletUnavailable => None,
		}
	}
}

/// The two claim extrinsics of the unified accounts pallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimCall {
	/// Bind the signer to its truncation-derived EVM address
	Default,
	/// Bind the signer to `evm_address`, proven by a signature over the claim payload
	Explicit {
		evm_address: EvmAddress,
		signature: [u8; EVM_SIGNATURE_LEN],
	},
}

impl ClaimCall {
	/// Name of the extrinsic in the unified accounts pallet
	pub fn call_name(&self) -> &'static str {
		match self {
			Self::Default => "claim_default_evm_address",
			Self::Explicit { .. } => "claim_evm_address",
		}
	}
}

/// A decoded dispatch error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchErrorDetails {
	/// Pallet index, for module errors
	pub module_index: Option<u8>,
	/// Error variant index within the pallet, for module errors
	pub error_index: Option<u8>,
	pub section: String,
	pub name: String,
	pub docs: Vec<String>,
}

/// One field of a decoded event, flattened to raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventField {
	pub name: Option<String>,
	pub bytes: Vec<u8>,
}

/// An event emitted by an extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEvent {
	pub pallet: String,
	pub variant: String,
	pub fields: Vec<EventField>,
}

impl ChainEvent {
	/// Case-insensitive match on pallet and variant names
	pub fn is(&self, pallet: &str, variant: &str) -> bool {
		self.pallet.eq_ignore_ascii_case(pallet) && self.variant.eq_ignore_ascii_case(variant)
	}

	/// Looks a field up by name, falling back to its position for unnamed fields
	pub fn field(&self, name: &str, position: usize) -> Option<&EventField> {
		self.fields
			.iter()
			.find(|field| field.name.as_deref() == Some(name))
			.or_else(|| {
				self.fields
					.get(position)
					.filter(|field| field.name.is_none())
			})
	}
}

/// Block inclusion of a submitted extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInclusion {
	/// `0x`-prefixed block hash
	pub block_hash: String,
	pub events: Vec<ChainEvent>,
	pub dispatch_error: Option<DispatchErrorDetails>,
}

/// Status updates of a submitted extrinsic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
	Ready,
	Broadcast,
	InBlock(TxInclusion),
	Finalized(TxInclusion),
	Invalid(String),
	Dropped(String),
	Usurped(String),
}

/// Point at which a claim is considered settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimFinality {
	/// First block inclusion
	InBlock,
	/// Block finalization
	#[default]
	Finalized,
}

/// Successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
	/// SS58 form of the claiming account
	pub account_id: String,
	/// Lowercase hex form of the bound EVM address
	pub evm_address: String,
	/// Block the claim was included in
	pub block_hash: String,
	#[serde(skip)]
	pub mapping: ClaimedMapping,
}
