//! Transport boundary between the account manager and a Substrate node.

use alloy::primitives::U256;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
	models::{
		ClaimCall, EvmAddress, StorageLookup, SubstrateAccountData, SubstrateAccountId, TxStatus,
	},
	services::blockchain::BlockChainError,
};

/// Status updates of a submitted extrinsic. Dropping the stream unsubscribes.
pub type TxStatusStream = BoxStream<'static, Result<TxStatus, BlockChainError>>;

/// Storage reads and claim submission against a Substrate node with the
/// unified accounts pallet
#[async_trait]
pub trait SubstrateTransport: Send + Sync {
	/// Key material able to sign the claim extrinsics
	type Signer: Send + Sync;

	/// Reads `System.Account`. `None` when the account has never existed.
	async fn account_data(
		&self,
		account_id: &SubstrateAccountId,
	) -> Result<Option<SubstrateAccountData>, BlockChainError>;

	/// Reads the EVM balance of `address`. `None` when the account or the pallet is absent.
	async fn evm_account_balance(
		&self,
		address: &EvmAddress,
	) -> Result<Option<U256>, BlockChainError>;

	/// Reads `UnifiedAccounts.EvmToNative`
	async fn claimed_substrate_account(
		&self,
		address: &EvmAddress,
	) -> Result<StorageLookup<SubstrateAccountId>, BlockChainError>;

	/// Reads `UnifiedAccounts.NativeToEvm`
	async fn claimed_evm_address(
		&self,
		account_id: &SubstrateAccountId,
	) -> Result<StorageLookup<EvmAddress>, BlockChainError>;

	/// Signs and submits a claim extrinsic, returning its status updates.
	/// `None` when the claim call is not part of the runtime; nothing is submitted then.
	async fn submit_claim(
		&self,
		signer: &Self::Signer,
		call: ClaimCall,
	) -> Result<Option<TxStatusStream>, BlockChainError>;
}
