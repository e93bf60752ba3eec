#![no_main]

use libfuzzer_sys::fuzz_target;
use selendra_unified_accounts::services::codec::{
	decode_substrate_address_with_prefix, encode_substrate_address,
};

fuzz_target!(|data: &str| {
	if let Ok((account_id, prefix)) = decode_substrate_address_with_prefix(data) {
		let encoded = encode_substrate_address(&account_id, prefix)
			.expect("decoded prefix must re-encode");
		let (decoded, decoded_prefix) = decode_substrate_address_with_prefix(&encoded)
			.expect("re-encoded address must decode");
		assert_eq!(decoded, account_id);
		assert_eq!(decoded_prefix, prefix);
	}
});
