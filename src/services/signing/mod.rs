//! Claim signing payload.
//!
//! To bind an arbitrary EVM address to a Substrate account, the owner of the EVM key
//! signs a 32-byte EIP-712 style digest committing to the Substrate account id. The
//! unified accounts pallet recomputes the same digest and recovers the signer.
//!
//! Layout, keccak256 throughout:
//!
//! ```text
//! domain_separator = keccak(DOMAIN_TYPEHASH ‖ keccak(name) ‖ keccak(version)
//!                           ‖ u256_be(chain_id) ‖ left_pad32(verifying_contract))
//! args_hash        = keccak(CLAIM_TYPEHASH ‖ keccak(account_id))
//! payload          = keccak(0x19 ‖ 0x01 ‖ domain_separator ‖ args_hash)
//! ```

use alloy::primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::models::{NetworkConfig, SubstrateAccountId};

/// EIP-712 domain type string
pub const EIP712_DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Claim struct type string
pub const CLAIM_TYPE: &str = "Claim(bytes substrateAddress)";

/// Domain a claim signature is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDomain {
	pub name: String,
	pub version: String,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl Default for ClaimDomain {
	fn default() -> Self {
		Self {
			name: "Selendra EVM Claim".to_string(),
			version: "1".to_string(),
			chain_id: 1961,
			verifying_contract: Address::ZERO,
		}
	}
}

impl From<&NetworkConfig> for ClaimDomain {
	fn from(config: &NetworkConfig) -> Self {
		Self {
			name: config.claim_domain_name.clone(),
			version: config.claim_domain_version.clone(),
			chain_id: config.evm_chain_id,
			verifying_contract: Address::ZERO,
		}
	}
}

/// Hash of the domain fields
pub fn domain_separator(domain: &ClaimDomain) -> B256 {
	let mut encoded = Vec::with_capacity(32 * 5);
	encoded.extend_from_slice(keccak256(EIP712_DOMAIN_TYPE).as_slice());
	encoded.extend_from_slice(keccak256(domain.name.as_bytes()).as_slice());
	encoded.extend_from_slice(keccak256(domain.version.as_bytes()).as_slice());
	encoded.extend_from_slice(&U256::from(domain.chain_id).to_be_bytes::<32>());
	encoded.extend_from_slice(domain.verifying_contract.into_word().as_slice());
	keccak256(&encoded)
}

/// Hash of the claim struct for `account_id`
pub fn args_hash(account_id: &SubstrateAccountId) -> B256 {
	let mut encoded = [0u8; 64];
	encoded[..32].copy_from_slice(keccak256(CLAIM_TYPE).as_slice());
	encoded[32..].copy_from_slice(keccak256(account_id.as_bytes()).as_slice());
	keccak256(encoded)
}

/// Digest an EVM wallet signs to claim its address for `account_id`
pub fn build_signing_payload(account_id: &SubstrateAccountId, domain: &ClaimDomain) -> B256 {
	let mut encoded = [0u8; 66];
	encoded[0] = 0x19;
	encoded[1] = 0x01;
	encoded[2..34].copy_from_slice(domain_separator(domain).as_slice());
	encoded[34..].copy_from_slice(args_hash(account_id).as_slice());
	keccak256(encoded)
}

/// [`build_signing_payload`] as `0x`-prefixed lowercase hex
pub fn signing_payload_hex(account_id: &SubstrateAccountId, domain: &ClaimDomain) -> String {
	format!(
		"0x{}",
		hex::encode(build_signing_payload(account_id, domain).as_slice())
	)
}
