//! Address data structures.
//!
//! A Substrate account id is 32 bytes and an EVM address is 20 bytes. The crate moves
//! between the two spaces in two different ways, and keeps them apart in the types:
//!
//! - *derived* addresses ([`DerivedEvmAddress`], [`DerivedSubstrateAddress`]) are
//!   computed by truncation or zero-padding. They are mechanically valid but nothing
//!   guarantees the same key controls both sides.
//! - a [`ClaimedMapping`] is the pair recorded on chain by a claim extrinsic. It is the
//!   only mapping that may be trusted for custody decisions.

use std::{fmt, hash::Hash, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::services::{
	accounts::AccountError,
	codec::{
		decode_substrate_address_with_prefix, encode_evm_address, encode_substrate_address,
		is_evm_address_format, parse_evm_address,
	},
};

/// SS58 prefix registered for Selendra
pub const SELENDRA_SS58_PREFIX: u16 = 204;

/// SS58 prefix for generic Substrate chains
pub const GENERIC_SUBSTRATE_SS58_PREFIX: u16 = 42;

/// 20-byte EVM account identifier
pub type EvmAddress = alloy::primitives::Address;

/// 32-byte Substrate account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SubstrateAccountId([u8; 32]);

impl SubstrateAccountId {
	/// Wraps raw account id bytes
	pub const fn new(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}

	/// Zero-pads an EVM address to 32 bytes, EVM bytes first
	pub fn from_evm_address(address: &EvmAddress) -> Self {
		let mut bytes = [0u8; 32];
		bytes[..20].copy_from_slice(address.as_slice());
		Self(bytes)
	}

	/// Returns the raw bytes
	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	/// Consumes the id, returning the raw bytes
	pub fn to_bytes(self) -> [u8; 32] {
		self.0
	}

	/// Truncates to the first 20 bytes
	pub fn truncated_evm_address(&self) -> EvmAddress {
		let mut bytes = [0u8; 20];
		bytes.copy_from_slice(&self.0[..20]);
		EvmAddress::from(bytes)
	}

	/// Encodes the id as SS58 with the given network prefix
	pub fn to_ss58(&self, prefix: u16) -> Result<String, AccountError> {
		encode_substrate_address(self, prefix)
	}
}

impl From<[u8; 32]> for SubstrateAccountId {
	fn from(bytes: [u8; 32]) -> Self {
		Self(bytes)
	}
}

impl AsRef<[u8]> for SubstrateAccountId {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Debug for SubstrateAccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SubstrateAccountId(0x{})", hex::encode(self.0))
	}
}

/// Which text form an address was given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
	Evm,
	Substrate,
}

/// Both text forms of one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPair {
	pub substrate: String,
	pub evm: String,
}

/// One logical account expressed in both address spaces.
///
/// Both forms are computed once, at construction:
///
/// - from an EVM address, the Substrate form is the address zero-padded to 32 bytes
///   and SS58-encoded with the network prefix;
/// - from an SS58 address, the EVM form is the first 20 bytes of the account id and
///   the Substrate form is re-encoded with the network prefix.
///
/// The second direction is lossy: accounts sharing their first 20 bytes derive the
/// same EVM address. Equality and hashing use the EVM form only.
#[derive(Debug, Clone)]
pub struct UnifiedAddress {
	account_id: SubstrateAccountId,
	evm_address: EvmAddress,
	substrate: String,
	evm: String,
	input: String,
	network_prefix: u16,
	kind: AddressKind,
}

impl UnifiedAddress {
	/// Parses an SS58 or `0x` address, deriving the other form with `network_prefix`
	pub fn new(address: &str, network_prefix: u16) -> Result<Self, AccountError> {
		let address = address.trim();

		if is_evm_address_format(address) {
			let evm_address = parse_evm_address(address)?;
			let account_id = SubstrateAccountId::from_evm_address(&evm_address);
			return Ok(Self {
				substrate: encode_substrate_address(&account_id, network_prefix)?,
				evm: address.to_lowercase(),
				input: address.to_string(),
				account_id,
				evm_address,
				network_prefix,
				kind: AddressKind::Evm,
			});
		}

		let (account_id, _) = decode_substrate_address_with_prefix(address)?;
		let evm_address = account_id.truncated_evm_address();
		Ok(Self {
			substrate: encode_substrate_address(&account_id, network_prefix)?,
			evm: encode_evm_address(&evm_address),
			input: address.to_string(),
			account_id,
			evm_address,
			network_prefix,
			kind: AddressKind::Substrate,
		})
	}

	/// Parses an address using the Selendra SS58 prefix
	pub fn parse(address: &str) -> Result<Self, AccountError> {
		Self::new(address, SELENDRA_SS58_PREFIX)
	}

	/// Builds the unified form of a raw account id
	pub fn from_account_id(
		account_id: SubstrateAccountId,
		network_prefix: u16,
	) -> Result<Self, AccountError> {
		let evm_address = account_id.truncated_evm_address();
		let substrate = encode_substrate_address(&account_id, network_prefix)?;
		Ok(Self {
			input: substrate.clone(),
			substrate,
			evm: encode_evm_address(&evm_address),
			account_id,
			evm_address,
			network_prefix,
			kind: AddressKind::Substrate,
		})
	}

	/// Substrate (SS58) form, encoded with [`Self::network_prefix`]
	pub fn to_substrate(&self) -> String {
		self.substrate.clone()
	}

	/// EVM (lowercase hex) form
	pub fn to_evm(&self) -> String {
		self.evm.clone()
	}

	/// Both forms
	pub fn get_both(&self) -> AddressPair {
		AddressPair {
			substrate: self.substrate.clone(),
			evm: self.evm.clone(),
		}
	}

	/// Raw 32-byte account id behind the Substrate form
	pub fn substrate_account_id(&self) -> &SubstrateAccountId {
		&self.account_id
	}

	/// Raw 20-byte address behind the EVM form
	pub fn evm_address(&self) -> &EvmAddress {
		&self.evm_address
	}

	/// Prefix of the Substrate form
	pub fn network_prefix(&self) -> u16 {
		self.network_prefix
	}

	/// Which form the address was parsed from
	pub fn kind(&self) -> AddressKind {
		self.kind
	}

	/// Compares EVM forms
	pub fn equals(&self, other: &UnifiedAddress) -> bool {
		self.evm == other.evm
	}
}

impl PartialEq for UnifiedAddress {
	fn eq(&self, other: &Self) -> bool {
		self.equals(other)
	}
}

impl Eq for UnifiedAddress {}

impl Hash for UnifiedAddress {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.evm.hash(state);
	}
}

impl FromStr for UnifiedAddress {
	type Err = AccountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for UnifiedAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			AddressKind::Evm => write!(f, "{}", self.evm),
			AddressKind::Substrate => write!(f, "{}", self.input),
		}
	}
}

impl Serialize for UnifiedAddress {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.get_both().serialize(serializer)
	}
}

/// EVM address derived from a Substrate account by truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedEvmAddress(EvmAddress);

impl DerivedEvmAddress {
	pub fn from_account_id(account_id: &SubstrateAccountId) -> Self {
		Self(account_id.truncated_evm_address())
	}

	pub fn address(&self) -> &EvmAddress {
		&self.0
	}
}

impl fmt::Display for DerivedEvmAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", encode_evm_address(&self.0))
	}
}

/// Substrate account derived from an EVM address by zero-padding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedSubstrateAddress {
	account_id: SubstrateAccountId,
	ss58: String,
}

impl DerivedSubstrateAddress {
	pub fn from_evm_address(address: &EvmAddress, prefix: u16) -> Result<Self, AccountError> {
		let account_id = SubstrateAccountId::from_evm_address(address);
		Ok(Self {
			ss58: encode_substrate_address(&account_id, prefix)?,
			account_id,
		})
	}

	pub fn account_id(&self) -> &SubstrateAccountId {
		&self.account_id
	}

	pub fn as_str(&self) -> &str {
		&self.ss58
	}
}

impl fmt::Display for DerivedSubstrateAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.ss58)
	}
}

/// Authoritative Substrate/EVM binding recorded on chain by a claim extrinsic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimedMapping {
	pub account_id: SubstrateAccountId,
	pub evm_address: EvmAddress,
}

impl ClaimedMapping {
	/// True when the claimed EVM address equals the truncation-derived one
	pub fn is_default(&self) -> bool {
		self.account_id.truncated_evm_address() == self.evm_address
	}
}

/// Classification returned by address validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
	Evm,
	Substrate,
	Invalid,
}

/// Result of validating a user-supplied address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidation {
	pub valid: bool,
	#[serde(rename = "type")]
	pub address_type: AddressType,
}

/// Output form for batch conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
	Substrate,
	Evm,
}

/// Output form for single-address format conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
	/// `0x` followed by the full 32-byte account id
	Hex,
	/// SS58 text form
	Ss58,
	/// `0x` followed by the 20-byte EVM address
	Ethereum,
}
