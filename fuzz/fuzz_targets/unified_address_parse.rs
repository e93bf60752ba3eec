#![no_main]

use libfuzzer_sys::fuzz_target;
use selendra_unified_accounts::{services::codec::is_evm_address_format, UnifiedAddress};

fuzz_target!(|data: &str| {
	let Ok(address) = UnifiedAddress::parse(data) else {
		return;
	};

	// Both forms must parse back to the same EVM form
	let from_evm = UnifiedAddress::parse(&address.to_evm()).expect("EVM form must parse");
	let from_substrate =
		UnifiedAddress::parse(&address.to_substrate()).expect("Substrate form must parse");
	assert!(is_evm_address_format(&address.to_evm()));
	assert_eq!(from_evm, address);
	assert_eq!(from_substrate, address);
});
