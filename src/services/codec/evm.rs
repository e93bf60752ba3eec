//! EVM address text form: `0x` followed by 40 hex digits.

use std::collections::HashMap;

use crate::{models::EvmAddress, services::accounts::AccountError};

const EVM_ADDRESS_HEX_LEN: usize = 40;

/// Returns true iff the string is `0x` followed by exactly 40 hex characters, any case
pub fn is_evm_address_format(address: &str) -> bool {
	let bytes = address.as_bytes();
	bytes.len() == EVM_ADDRESS_HEX_LEN + 2
		&& bytes.starts_with(b"0x")
		&& bytes[2..].iter().all(u8::is_ascii_hexdigit)
}

/// Parses a `0x`-prefixed 40 hex digit string into an EVM address
pub fn parse_evm_address(address: &str) -> Result<EvmAddress, AccountError> {
	if !is_evm_address_format(address) {
		return Err(AccountError::invalid_address(
			"Expected 0x followed by 40 hex characters",
			Some(HashMap::from([(
				"address".to_string(),
				address.to_string(),
			)])),
		));
	}

	let mut bytes = [0u8; 20];
	hex::decode_to_slice(&address[2..], &mut bytes).map_err(|e| {
		AccountError::invalid_address(format!("Invalid hex in EVM address: {}", e), None)
	})?;

	Ok(EvmAddress::from(bytes))
}

/// Canonical lowercase text form of an EVM address
pub fn encode_evm_address(address: &EvmAddress) -> String {
	format!("0x{}", hex::encode(address.as_slice()))
}
