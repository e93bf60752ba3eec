//! Balance aggregates across the Substrate and EVM sides of an account.

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{AddressPair, ClaimedMapping};

/// Balances held by a Substrate account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubstrateBalance {
	#[serde(with = "decimal")]
	pub free: U256,
	#[serde(with = "decimal")]
	pub reserved: U256,
	#[serde(with = "decimal")]
	pub frozen: U256,
}

/// Combined view of an account's balances on both sides.
///
/// `total` is `substrate.free + evm`; reserved and frozen funds are not spendable and
/// are left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnifiedBalance {
	pub substrate: SubstrateBalance,
	#[serde(with = "decimal")]
	pub evm: U256,
	#[serde(with = "decimal")]
	pub total: U256,
}

impl UnifiedBalance {
	pub fn new(substrate: SubstrateBalance, evm: U256) -> Self {
		Self {
			total: substrate.free.saturating_add(evm),
			substrate,
			evm,
		}
	}

	/// True iff both the Substrate free balance and the EVM balance are positive
	pub fn is_unified(&self) -> bool {
		!self.substrate.free.is_zero() && !self.evm.is_zero()
	}

	pub fn is_empty(&self) -> bool {
		self.substrate.free.is_zero()
			&& self.substrate.reserved.is_zero()
			&& self.substrate.frozen.is_zero()
			&& self.evm.is_zero()
	}
}

/// Everything known about one account across both chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedAccountInfo {
	/// Derived forms of the queried address
	pub address: AddressPair,
	pub balance: UnifiedBalance,
	/// Authoritative on-chain mapping, if the account has claimed one
	#[serde(skip_serializing_if = "Option::is_none")]
	pub claimed: Option<AddressPair>,
	#[serde(skip)]
	pub mapping: Option<ClaimedMapping>,
	/// True if any balance is non-zero or a claim exists
	pub exists: bool,
}

/// Serializes `U256` amounts as decimal strings
pub(crate) mod decimal {
	use super::*;

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		let value = String::deserialize(deserializer)?;
		U256::from_str_radix(&value, 10).map_err(serde::de::Error::custom)
	}
}
