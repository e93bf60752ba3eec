use proptest::prelude::*;

use selendra_unified_accounts::{EvmAddress, SubstrateAccountId};

pub fn evm_address_strategy() -> impl Strategy<Value = EvmAddress> {
	any::<[u8; 20]>().prop_map(EvmAddress::from)
}

/// Account ids with at least one non-zero byte after the first 20
pub fn non_padded_account_strategy() -> impl Strategy<Value = SubstrateAccountId> {
	(any::<[u8; 20]>(), any::<[u8; 12]>())
		.prop_filter("tail must be non-zero", |(_, tail)| tail.iter().any(|b| *b != 0))
		.prop_map(|(head, tail)| {
			let mut bytes = [0u8; 32];
			bytes[..20].copy_from_slice(&head);
			bytes[20..].copy_from_slice(&tail);
			SubstrateAccountId::new(bytes)
		})
}

pub fn account_id_strategy() -> impl Strategy<Value = SubstrateAccountId> {
	any::<[u8; 32]>().prop_map(SubstrateAccountId::new)
}

/// SS58 prefixes covering both the one-byte and two-byte encodings
pub fn ss58_prefix_strategy() -> impl Strategy<Value = u16> {
	prop_oneof![0u16..64, 64u16..=16383, Just(42u16), Just(204u16)]
}

/// Mixed-case rendering of a lowercase hex string, driven by `mask`
pub fn mix_case(hex: &str, mask: &[bool]) -> String {
	hex.chars()
		.zip(mask.iter().cycle())
		.map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
		.collect()
}

/// Strings that are never `0x` followed by exactly 40 hex characters
pub fn malformed_evm_strategy() -> impl Strategy<Value = String> {
	prop_oneof![
		// wrong length
		"0x[0-9a-fA-F]{0,39}",
		"0x[0-9a-fA-F]{41,60}",
		// missing prefix
		"[0-9a-fA-F]{40}",
		// one non-hex character
		("[0-9a-f]{0,39}", "[g-zG-Z]", "[0-9a-f]{39}").prop_map(|(head, bad, tail)| {
			let tail = &tail[..39 - head.len()];
			format!("0x{}{}{}", head, bad, tail)
		}),
	]
}
