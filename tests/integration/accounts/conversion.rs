//! Address conversion, validation and signing payload tests

use std::sync::Arc;

use selendra_unified_accounts::{
	AccountError, AddressFormat, AddressType, NetworkConfig, TargetFormat, UnifiedAccountManager,
};

use crate::integration::mocks::MockSubstrateNode;

const EVM: &str = "0x1234567890abcdef1234567890abcdef12345678";
const EVM_SS58: &str = "seXcMBzMNemxbN5pehfDb6NyghRioM6hKfBKm514WpZdHuXbE";
const ALICE: &str = "sebzir9JsX62xXjDUqccffqphuj9MiC9HjzqPoz7icuj7UYLH";
const ALICE_GENERIC: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

fn manager() -> UnifiedAccountManager<MockSubstrateNode> {
	UnifiedAccountManager::with_transport(Arc::new(MockSubstrateNode::new()))
}

#[test]
fn test_validate_address() {
	let manager = manager();

	let evm = manager.validate_address(EVM);
	assert!(evm.valid);
	assert_eq!(evm.address_type, AddressType::Evm);

	let substrate = manager.validate_address(&format!("  {}\n", ALICE));
	assert!(substrate.valid);
	assert_eq!(substrate.address_type, AddressType::Substrate);

	for input in ["", "   ", "0x1234", "hello", &ALICE[..ALICE.len() - 1]] {
		let validation = manager.validate_address(input);
		assert!(!validation.valid, "{:?} should be invalid", input);
		assert_eq!(validation.address_type, AddressType::Invalid);
	}
}

#[test]
fn test_batch_convert() {
	let manager = manager();

	let substrate = manager
		.batch_convert(&[EVM, ALICE], AddressFormat::Substrate)
		.unwrap();
	assert_eq!(substrate, vec![EVM_SS58.to_string(), ALICE.to_string()]);

	let evm = manager
		.batch_convert(&[EVM_SS58.to_string(), ALICE.to_string()], AddressFormat::Evm)
		.unwrap();
	assert_eq!(evm[0], EVM);
	assert_eq!(evm[1], &ALICE_HEX[..42]);
}

#[test]
fn test_batch_convert_uses_network_prefix_for_substrate_output() {
	let manager = manager();

	let substrate = manager
		.batch_convert(&[EVM, ALICE_GENERIC], AddressFormat::Substrate)
		.unwrap();
	assert_eq!(substrate, vec![EVM_SS58.to_string(), ALICE.to_string()]);

	let unified = manager.create_address(ALICE_GENERIC).unwrap();
	assert_eq!(unified.network_prefix(), 204);
	assert_eq!(unified.to_substrate(), ALICE);
	assert_eq!(unified.get_both().substrate, ALICE);

	let generic = UnifiedAccountManager::new(
		Arc::new(MockSubstrateNode::new()),
		&NetworkConfig::generic_substrate(),
	);
	assert_eq!(
		generic
			.batch_convert(&[ALICE], AddressFormat::Substrate)
			.unwrap(),
		vec![ALICE_GENERIC.to_string()]
	);
}

#[test]
fn test_batch_convert_reports_failing_index() {
	let manager = manager();

	let error = manager
		.batch_convert(&[EVM, ALICE, "0xnope", "also bad"], AddressFormat::Evm)
		.unwrap_err();

	let AccountError::InvalidAddress(ctx) = &error else {
		panic!("expected InvalidAddress, got {:?}", error);
	};
	assert_eq!(ctx.metadata_value("index"), Some("2"));
	assert_eq!(ctx.metadata_value("address"), Some("0xnope"));
	assert!(error.to_string().contains("index 2"));
}

#[test]
fn test_derivations() {
	let manager = manager();

	assert_eq!(
		manager.substrate_to_evm(ALICE).unwrap().to_string(),
		&ALICE_HEX[..42]
	);
	assert_eq!(
		manager.substrate_to_evm(ALICE_GENERIC).unwrap().to_string(),
		&ALICE_HEX[..42]
	);
	assert_eq!(manager.evm_to_substrate(EVM).unwrap().as_str(), EVM_SS58);

	assert!(matches!(
		manager.substrate_to_evm(EVM),
		Err(AccountError::InvalidAddress(_))
	));
	assert!(matches!(
		manager.evm_to_substrate(ALICE),
		Err(AccountError::InvalidAddress(_))
	));
}

#[test]
fn test_generic_network_prefix() {
	let manager = UnifiedAccountManager::new(
		Arc::new(MockSubstrateNode::new()),
		&NetworkConfig::generic_substrate(),
	);

	assert_eq!(manager.network_prefix(), 42);
	assert_eq!(
		manager.convert_address_format(ALICE, TargetFormat::Ss58).unwrap(),
		ALICE_GENERIC
	);
}

#[test]
fn test_convert_address_format() {
	let manager = manager();

	assert_eq!(
		manager.convert_address_format(ALICE_GENERIC, TargetFormat::Ss58).unwrap(),
		ALICE
	);
	assert_eq!(
		manager.convert_address_format(ALICE, TargetFormat::Hex).unwrap(),
		ALICE_HEX
	);
	assert_eq!(
		manager.convert_address_format(ALICE, TargetFormat::Ethereum).unwrap(),
		&ALICE_HEX[..42]
	);
	assert_eq!(
		manager.convert_address_format(EVM, TargetFormat::Hex).unwrap(),
		format!("{}{}", EVM, "0".repeat(24))
	);
}

#[test]
fn test_are_same_entity() {
	let manager = manager();

	assert!(manager.are_same_entity(ALICE, ALICE_GENERIC).unwrap());
	assert!(manager.are_same_entity(ALICE, &ALICE_HEX[..42]).unwrap());
	assert!(manager.are_same_entity(&ALICE_HEX[..42], ALICE).unwrap());
	assert!(manager.are_same_entity(EVM, EVM_SS58).unwrap());
	assert!(!manager.are_same_entity(EVM, ALICE).unwrap());
	assert!(manager.are_same_entity(EVM, "bogus").is_err());
}

#[test]
fn test_build_signing_payload() {
	let manager = manager();

	let payload = manager.build_signing_payload(ALICE).unwrap();
	assert_eq!(
		payload,
		"0x83a8ed3032377291d7a727c6321da218743b89eaecc56f902f9b203b742bc8e3"
	);
	assert_eq!(manager.build_signing_payload(ALICE).unwrap(), payload);
	assert_eq!(manager.build_signing_payload(ALICE_GENERIC).unwrap(), payload);

	let testnet = UnifiedAccountManager::new(
		Arc::new(MockSubstrateNode::new()),
		&NetworkConfig::selendra_testnet(),
	);
	assert_eq!(
		testnet.build_signing_payload(ALICE).unwrap(),
		"0x95b2f34a52027cd7598329b35c8c6b82864c4135c2980e328f98e2f595202e7d"
	);

	assert!(matches!(
		manager.build_signing_payload(EVM),
		Err(AccountError::InvalidAddress(_))
	));
}

#[test]
fn test_create_address_roundtrips_through_manager() {
	let manager = manager();

	let unified = manager.create_address(EVM).unwrap();
	assert_eq!(unified.to_substrate(), EVM_SS58);
	assert_eq!(unified.network_prefix(), 204);
	let back = manager.create_address(&unified.to_substrate()).unwrap();
	assert_eq!(back, unified);
}
