//! Claim submission tests

use std::{
	sync::{atomic::Ordering, Arc},
	time::Duration,
};

use selendra_unified_accounts::{
	models::{ClaimCall, ClaimFinality, TxStatus},
	services::{blockchain::BlockChainError, codec::decode_substrate_address},
	AccountError, EvmAddress, NetworkConfig, UnifiedAccountManager,
};
use tokio::sync::watch;

use crate::integration::mocks::{
	account_claimed_event, failed_inclusion, inclusion, status_stream, MockSubstrateNode,
	TestSigner,
};

const ALICE: &str = "sebzir9JsX62xXjDUqccffqphuj9MiC9HjzqPoz7icuj7UYLH";
const EVM: &str = "0x1234567890abcdef1234567890abcdef12345678";
const BLOCK: &str = "0x2b1e6f0c2a4f1a0f0c7e3e5a0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b";

fn manager_with(
	node: MockSubstrateNode,
	finality: ClaimFinality,
) -> UnifiedAccountManager<MockSubstrateNode> {
	let mut network = NetworkConfig::selendra_mainnet();
	network.finality = finality;
	UnifiedAccountManager::new(Arc::new(node), &network)
}

#[tokio::test]
async fn test_default_claim_success() {
	let alice = decode_substrate_address(ALICE).unwrap();
	let derived = alice.truncated_evm_address();
	let (stream, dropped) = status_stream(
		vec![
			Ok(TxStatus::Ready),
			Ok(TxStatus::Broadcast),
			Ok(TxStatus::InBlock(inclusion(BLOCK, vec![]))),
			Ok(TxStatus::Finalized(inclusion(
				BLOCK,
				vec![account_claimed_event(&alice, &derived)],
			))),
		],
		false,
	);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.withf(|_, call| *call == ClaimCall::Default)
		.times(1)
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let outcome = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap();

	assert_eq!(outcome.account_id, ALICE);
	assert_eq!(
		outcome.evm_address,
		manager.substrate_to_evm(ALICE).unwrap().to_string()
	);
	assert_eq!(outcome.block_hash, BLOCK);
	assert!(outcome.mapping.is_default());
	assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_in_block_finality_settles_on_first_inclusion() {
	let alice = decode_substrate_address(ALICE).unwrap();
	let derived = alice.truncated_evm_address();
	let (stream, dropped) = status_stream(
		vec![Ok(TxStatus::InBlock(inclusion(
			BLOCK,
			vec![account_claimed_event(&alice, &derived)],
		)))],
		false,
	);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::InBlock);
	let outcome = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap();

	assert_eq!(outcome.block_hash, BLOCK);
	assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_claim_dispatch_error() {
	let (stream, dropped) = status_stream(
		vec![Ok(TxStatus::Finalized(failed_inclusion(
			BLOCK,
			"unifiedAccounts",
			"AlreadyClaimed",
		)))],
		false,
	);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();

	let message = error.to_string();
	assert!(message.contains("unifiedAccounts"), "{}", message);
	assert!(message.contains("AlreadyClaimed"), "{}", message);
	assert!(matches!(error, AccountError::ClaimFailed { .. }));
	assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_claim_without_event() {
	let (stream, _) = status_stream(
		vec![Ok(TxStatus::Finalized(inclusion(BLOCK, vec![])))],
		false,
	);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();

	let AccountError::ClaimEventMissing(ctx) = &error else {
		panic!("expected ClaimEventMissing, got {:?}", error);
	};
	assert_eq!(ctx.metadata_value("block_hash"), Some(BLOCK));
}

#[tokio::test]
async fn test_rejected_transactions() {
	for status in [
		TxStatus::Invalid("bad signature".to_string()),
		TxStatus::Dropped("pool full".to_string()),
		TxStatus::Usurped("replaced".to_string()),
	] {
		let (stream, dropped) = status_stream(vec![Ok(TxStatus::Ready), Ok(status)], false);

		let mut node = MockSubstrateNode::new();
		node.expect_submit_claim()
			.return_once(move |_, _| Ok(Some(stream)));

		let manager = manager_with(node, ClaimFinality::Finalized);
		let error = manager
			.claim_default_evm_address(&TestSigner, None)
			.await
			.unwrap_err();

		assert!(matches!(
			error,
			AccountError::Transport(BlockChainError::TransactionError(_))
		));
		assert!(dropped.load(Ordering::SeqCst));
	}
}

#[tokio::test]
async fn test_stream_error_and_early_end() {
	let (stream, dropped) = status_stream(
		vec![Err(BlockChainError::connection_error(
			"subscription closed",
			None,
			None,
		))],
		false,
	);
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));
	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();
	assert!(matches!(
		error,
		AccountError::Transport(BlockChainError::ConnectionError(_))
	));
	assert!(dropped.load(Ordering::SeqCst));

	let (stream, _) = status_stream(
		vec![Ok(TxStatus::Ready), Ok(TxStatus::InBlock(inclusion(BLOCK, vec![])))],
		true,
	);
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));
	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();
	assert!(error.to_string().contains("ended before the claim settled"));
}

#[tokio::test]
async fn test_submission_failure_propagates() {
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim().return_once(|_, _| {
		Err(BlockChainError::transaction_error(
			"Failed to submit claim_default_evm_address",
			None,
			None,
		))
	});

	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();
	assert!(matches!(error, AccountError::Transport(_)));
}

#[tokio::test]
async fn test_missing_claim_call_reports_pallet_unavailable() {
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.times(1)
		.return_once(|_, _| Ok(None));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let error = manager
		.claim_default_evm_address(&TestSigner, None)
		.await
		.unwrap_err();

	let AccountError::PalletUnavailable(ctx) = &error else {
		panic!("expected PalletUnavailable, got {:?}", error);
	};
	assert_eq!(
		ctx.metadata_value("call"),
		Some("UnifiedAccounts.claim_default_evm_address")
	);
	assert!(!error.is_input_error());
}

#[tokio::test]
async fn test_cancellation_drops_subscription() {
	let (stream, dropped) = status_stream(vec![Ok(TxStatus::Ready)], false);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let (cancel, receiver) = watch::channel(false);

	let claim = manager.claim_default_evm_address(&TestSigner, Some(receiver));
	let trigger = async {
		tokio::time::sleep(Duration::from_millis(20)).await;
		cancel.send(true).unwrap();
	};
	let (result, _) = tokio::time::timeout(Duration::from_secs(5), async {
		tokio::join!(claim, trigger)
	})
	.await
	.unwrap();

	assert!(matches!(result, Err(AccountError::Cancelled(_))));
	assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_timeout_drops_subscription() {
	let (stream, dropped) = status_stream(vec![Ok(TxStatus::Broadcast)], false);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let result = tokio::time::timeout(
		Duration::from_millis(20),
		manager.claim_default_evm_address(&TestSigner, None),
	)
	.await;

	assert!(result.is_err());
	assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_explicit_claim_success() {
	let alice = decode_substrate_address(ALICE).unwrap();
	let evm: EvmAddress = EVM.parse().unwrap();
	let signature = format!("0x{}", "1b".repeat(65));
	let (stream, _) = status_stream(
		vec![Ok(TxStatus::Finalized(inclusion(
			BLOCK,
			vec![account_claimed_event(&alice, &evm)],
		)))],
		false,
	);

	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim()
		.withf(move |_, call| {
			*call
				== ClaimCall::Explicit {
					evm_address: evm,
					signature: [0x1b; 65],
				}
		})
		.times(1)
		.return_once(move |_, _| Ok(Some(stream)));

	let manager = manager_with(node, ClaimFinality::Finalized);
	let outcome = manager
		.claim_evm_address(&TestSigner, EVM, &signature, None)
		.await
		.unwrap();

	assert_eq!(outcome.account_id, ALICE);
	assert_eq!(outcome.evm_address, EVM);
	assert!(!outcome.mapping.is_default());
}

#[tokio::test]
async fn test_explicit_claim_rejects_bad_signature_without_network() {
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim().never();
	let manager = manager_with(node, ClaimFinality::Finalized);

	// 64 bytes, with and without prefix, and a non-hex signature of the right length
	for signature in [
		"ab".repeat(64),
		format!("0x{}", "ab".repeat(64)),
		"zz".repeat(65),
	] {
		let error = manager
			.claim_evm_address(&TestSigner, EVM, &signature, None)
			.await
			.unwrap_err();
		assert!(
			matches!(error, AccountError::InvalidSignatureFormat(_)),
			"{:?}",
			error
		);
	}
}

#[tokio::test]
async fn test_explicit_claim_rejects_bad_address_without_network() {
	let mut node = MockSubstrateNode::new();
	node.expect_submit_claim().never();
	let manager = manager_with(node, ClaimFinality::Finalized);

	let error = manager
		.claim_evm_address(&TestSigner, ALICE, &"ab".repeat(65), None)
		.await
		.unwrap_err();
	assert!(matches!(error, AccountError::InvalidAddress(_)));
	assert!(error.is_input_error());
}
