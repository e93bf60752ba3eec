//! SS58 address encoding and decoding.
//!
//! Layout: `base58(prefix || account_id || checksum)` where the checksum is the first
//! two bytes of `blake2b_512("SS58PRE" || prefix || account_id)`. Prefixes below 64 take
//! one byte, prefixes up to 16383 take two.

use std::collections::HashMap;

use blake2::{Blake2b512, Digest};

use crate::{models::SubstrateAccountId, services::accounts::AccountError};

const SS58_CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const ACCOUNT_ID_LEN: usize = 32;
const MAX_PREFIX: u16 = 0b0011_1111_1111_1111;

/// Encode a 32-byte account id as an SS58 string with the given network prefix
pub fn encode_substrate_address(
	account_id: &SubstrateAccountId,
	prefix: u16,
) -> Result<String, AccountError> {
	let mut payload = encode_prefix(prefix)?;
	payload.extend_from_slice(account_id.as_bytes());

	let checksum = ss58_checksum(&payload);
	payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

	Ok(bs58::encode(payload).into_string())
}

/// Decode an SS58 string into its account id, validating the checksum
pub fn decode_substrate_address(address: &str) -> Result<SubstrateAccountId, AccountError> {
	decode_substrate_address_with_prefix(address).map(|(account_id, _)| account_id)
}

/// Decode an SS58 string into its account id and network prefix
pub fn decode_substrate_address_with_prefix(
	address: &str,
) -> Result<(SubstrateAccountId, u16), AccountError> {
	let context = || HashMap::from([("address".to_string(), address.to_string())]);

	let decoded = bs58::decode(address).into_vec().map_err(|e| {
		AccountError::invalid_address(format!("Invalid base58: {}", e), Some(context()))
	})?;

	if decoded.is_empty() {
		return Err(AccountError::invalid_address(
			"Empty SS58 address",
			Some(context()),
		));
	}

	let (prefix, prefix_len) = decode_prefix(&decoded).map_err(|msg| {
		AccountError::invalid_address(msg, Some(context()))
	})?;

	if decoded.len() != prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN {
		return Err(AccountError::invalid_address(
			format!(
				"Invalid SS58 payload length: expected {}, got {}",
				prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN,
				decoded.len()
			),
			Some(context()),
		));
	}

	let checksum_start = decoded.len() - CHECKSUM_LEN;
	let expected = ss58_checksum(&decoded[..checksum_start]);
	if decoded[checksum_start..] != expected[..CHECKSUM_LEN] {
		return Err(AccountError::invalid_address(
			"Invalid SS58 checksum",
			Some(context()),
		));
	}

	let mut account_id = [0u8; ACCOUNT_ID_LEN];
	account_id.copy_from_slice(&decoded[prefix_len..checksum_start]);

	Ok((SubstrateAccountId::new(account_id), prefix))
}

/// Returns true if the string decodes as SS58 under any network prefix
pub fn is_substrate_address_format(address: &str) -> bool {
	decode_substrate_address(address).is_ok()
}

/// Returns true if the string decodes as SS58 and carries the given network prefix
pub fn substrate_address_has_prefix(address: &str, prefix: u16) -> bool {
	matches!(decode_substrate_address_with_prefix(address), Ok((_, p)) if p == prefix)
}

fn encode_prefix(prefix: u16) -> Result<Vec<u8>, AccountError> {
	match prefix {
		0..=63 => Ok(vec![prefix as u8]),
		64..=MAX_PREFIX => {
			let first = (((prefix & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
			let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
			Ok(vec![first, second])
		}
		_ => Err(AccountError::invalid_address(
			format!("Invalid SS58 prefix: {}", prefix),
			None,
		)),
	}
}

fn decode_prefix(data: &[u8]) -> Result<(u16, usize), String> {
	match data[0] {
		0..=63 => Ok((data[0] as u16, 1)),
		64..=127 => {
			if data.len() < 2 {
				return Err("Address too short for two-byte prefix".to_string());
			}
			let lower = ((data[0] & 0b0011_1111) << 2) | (data[1] >> 6);
			let upper = data[1] & 0b0011_1111;
			Ok((((upper as u16) << 8) | lower as u16, 2))
		}
		other => Err(format!("Invalid SS58 prefix byte: {}", other)),
	}
}

fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
	let mut hasher = Blake2b512::new();
	hasher.update(SS58_CHECKSUM_PREFIX);
	hasher.update(payload);
	let mut checksum = [0u8; 64];
	checksum.copy_from_slice(&hasher.finalize());
	checksum
}
