//! Claimed mapping lookup tests

use std::sync::Arc;

use selendra_unified_accounts::{
	models::StorageLookup,
	services::{blockchain::BlockChainError, codec::decode_substrate_address},
	AccountError, EvmAddress, SubstrateAccountId, UnifiedAccountManager,
};

use crate::integration::mocks::MockSubstrateNode;

const EVM: &str = "0x1234567890abcdef1234567890abcdef12345678";
const ALICE: &str = "sebzir9JsX62xXjDUqccffqphuj9MiC9HjzqPoz7icuj7UYLH";

#[tokio::test]
async fn test_absent_mapping_resolves_to_none() {
	let mut node = MockSubstrateNode::new();
	node.expect_claimed_substrate_account()
		.times(1)
		.returning(|_| Ok(StorageLookup::NotFound));

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));
	let result = manager.get_substrate_address_from_mapping(EVM).await;

	assert_eq!(result.unwrap(), None);
}

#[tokio::test]
async fn test_missing_pallet_resolves_to_none() {
	let mut node = MockSubstrateNode::new();
	node.expect_claimed_evm_address()
		.returning(|_| Ok(StorageLookup::PalletUnavailable));
	node.expect_claimed_substrate_account()
		.returning(|_| Ok(StorageLookup::PalletUnavailable));

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));

	assert_eq!(manager.get_evm_address_from_mapping(ALICE).await.unwrap(), None);
	assert!(!manager.has_mapping_on_chain(ALICE).await.unwrap());
	assert!(!manager.has_mapping_on_chain(EVM).await.unwrap());
}

#[tokio::test]
async fn test_claimed_mapping_is_authoritative() {
	let alice = decode_substrate_address(ALICE).unwrap();
	let claimed_evm: EvmAddress = EVM.parse().unwrap();

	let mut node = MockSubstrateNode::new();
	node.expect_claimed_substrate_account()
		.withf(move |address| *address == claimed_evm)
		.returning(move |_| Ok(StorageLookup::Found(alice)));
	node.expect_claimed_evm_address()
		.withf(move |account_id| *account_id == alice)
		.returning(move |_| Ok(StorageLookup::Found(claimed_evm)));

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));

	assert_eq!(
		manager
			.get_substrate_address_from_mapping(&EVM.to_uppercase().replacen("0X", "0x", 1))
			.await
			.unwrap()
			.as_deref(),
		Some(ALICE)
	);
	assert_eq!(
		manager
			.get_evm_address_from_mapping(ALICE)
			.await
			.unwrap()
			.as_deref(),
		Some(EVM)
	);

	let mapping = manager.claimed_mapping_for_substrate(ALICE).await.unwrap().unwrap();
	assert_eq!(mapping.account_id, alice);
	assert_eq!(mapping.evm_address, claimed_evm);
	// Alice's claimed address is not her truncation-derived one
	assert!(!mapping.is_default());
	assert_ne!(
		manager.substrate_to_evm(ALICE).unwrap().to_string(),
		EVM
	);

	assert!(manager.has_mapping_on_chain(ALICE).await.unwrap());
	assert!(manager.has_mapping_on_chain(EVM).await.unwrap());
}

#[tokio::test]
async fn test_mapping_lookup_transport_failure_propagates() {
	let mut node = MockSubstrateNode::new();
	node.expect_claimed_evm_address().returning(|_| {
		Err(BlockChainError::request_error("storage query failed", None, None))
	});

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));
	let error = manager.get_evm_address_from_mapping(ALICE).await.unwrap_err();

	assert!(matches!(error, AccountError::Transport(_)));
}

#[tokio::test]
async fn test_mapping_lookup_rejects_malformed_input() {
	let mut node = MockSubstrateNode::new();
	node.expect_claimed_evm_address().never();
	node.expect_claimed_substrate_account().never();

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));

	assert!(matches!(
		manager.get_evm_address_from_mapping(EVM).await,
		Err(AccountError::InvalidAddress(_))
	));
	assert!(matches!(
		manager.get_substrate_address_from_mapping(ALICE).await,
		Err(AccountError::InvalidAddress(_))
	));
}

#[tokio::test]
async fn test_account_info_includes_claimed_mapping() {
	let claimed_account = SubstrateAccountId::new([9u8; 32]);

	let mut node = MockSubstrateNode::new();
	node.expect_account_data().returning(|_| Ok(None));
	node.expect_evm_account_balance().returning(|_| Ok(None));
	node.expect_claimed_substrate_account()
		.returning(move |_| Ok(StorageLookup::Found(claimed_account)));

	let manager = UnifiedAccountManager::with_transport(Arc::new(node));
	let info = manager.get_account_info(EVM).await.unwrap();

	assert!(info.exists);
	assert!(info.balance.is_empty());
	let claimed = info.claimed.unwrap();
	assert_eq!(claimed.evm, EVM);
	assert_eq!(claimed.substrate, claimed_account.to_ss58(204).unwrap());
	assert_eq!(info.mapping.unwrap().account_id, claimed_account);
}
