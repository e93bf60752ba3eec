//! Substrate transport over `subxt`.
//!
//! Uses the dynamic API so that no generated runtime bindings are needed. Every value
//! read from the node is converted into the neutral model types here; nothing outside
//! this module sees a `subxt` type.

use std::{collections::HashMap, marker::PhantomData};

use alloy::primitives::U256;
use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use subxt::{
	blocks::ExtrinsicEvents,
	dynamic::Value,
	error::DispatchError,
	events::EventDetails,
	ext::scale_value::{At, Composite, Primitive, ValueDef},
	tx::{Signer, TxInBlock, TxStatus as SubxtTxStatus},
	OnlineClient, SubstrateConfig,
};
use tracing::{instrument, warn};

use crate::{
	models::{
		ChainEvent, ClaimCall, DispatchErrorDetails, EventField, EvmAddress, NetworkConfig,
		StorageLookup, SubstrateAccountData, SubstrateAccountId, TxInclusion, TxStatus,
	},
	services::blockchain::{BlockChainError, SubstrateTransport, TxStatusStream},
};

const SYSTEM_PALLET: &str = "System";
const EVM_PALLET: &str = "EVM";
const UNIFIED_ACCOUNTS_PALLET: &str = "UnifiedAccounts";

type Client = OnlineClient<SubstrateConfig>;

/// [`SubstrateTransport`] backed by a `subxt` online client
///
/// `S` is the signer type accepted by [`SubstrateTransport::submit_claim`].
pub struct SubxtTransport<S> {
	api: Client,
	_signer: PhantomData<fn() -> S>,
}

impl<S> Clone for SubxtTransport<S> {
	fn clone(&self) -> Self {
		Self {
			api: self.api.clone(),
			_signer: PhantomData,
		}
	}
}

impl<S> SubxtTransport<S> {
	/// Creates a transport over an existing client
	pub fn new_with_client(api: Client) -> Self {
		Self {
			api,
			_signer: PhantomData,
		}
	}

	/// Connects to the node named by `network`
	pub async fn new(network: &NetworkConfig) -> Result<Self, BlockChainError> {
		let api = Client::from_url(&network.rpc_url).await.map_err(|e| {
			BlockChainError::connection_error(
				"Failed to connect to Substrate node",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"rpc_url".to_string(),
					network.rpc_url.clone(),
				)])),
			)
		})?;
		Ok(Self::new_with_client(api))
	}

	fn has_storage_entry(&self, pallet: &str, entry: &str) -> bool {
		let metadata = self.api.metadata();
		metadata
			.pallet_by_name(pallet)
			.and_then(|pallet| pallet.storage())
			.and_then(|storage| storage.entry_by_name(entry))
			.is_some()
	}

	fn has_call(&self, pallet: &str, call: &str) -> bool {
		let metadata = self.api.metadata();
		metadata
			.pallet_by_name(pallet)
			.and_then(|pallet| pallet.call_variant_by_name(call))
			.is_some()
	}

	/// Fetches a storage value at the latest block, decoded into a dynamic value
	async fn fetch(
		&self,
		pallet: &str,
		entry: &str,
		key: &[u8],
	) -> Result<Option<Value<u32>>, BlockChainError> {
		let address = subxt::dynamic::storage(pallet, entry, vec![Value::from_bytes(key)]);
		let storage = self.api.storage().at_latest().await?;
		let Some(thunk) = storage.fetch(&address).await? else {
			return Ok(None);
		};

		thunk.to_value().map(Some).map_err(|e| {
			BlockChainError::request_error(
				format!("Failed to decode {}.{}: {}", pallet, entry, e),
				None,
				None,
			)
		})
	}
}

#[async_trait]
impl<S> SubstrateTransport for SubxtTransport<S>
where
	S: Signer<SubstrateConfig> + Send + Sync,
{
	type Signer = S;

	#[instrument(skip(self))]
	async fn account_data(
		&self,
		account_id: &SubstrateAccountId,
	) -> Result<Option<SubstrateAccountData>, BlockChainError> {
		let Some(value) = self
			.fetch(SYSTEM_PALLET, "Account", account_id.as_bytes())
			.await?
		else {
			return Ok(None);
		};

		let data = value.at("data");
		let amount = |field: &str| data.at(field).and_then(value_to_u256).unwrap_or_default();
		Ok(Some(SubstrateAccountData {
			free: amount("free"),
			reserved: amount("reserved"),
			frozen: amount("frozen"),
		}))
	}

	#[instrument(skip(self))]
	async fn evm_account_balance(
		&self,
		address: &EvmAddress,
	) -> Result<Option<U256>, BlockChainError> {
		if !self.has_storage_entry(EVM_PALLET, "Accounts") {
			return Ok(None);
		}

		let value = self
			.fetch(EVM_PALLET, "Accounts", address.as_slice())
			.await?;
		Ok(value.and_then(|value| value.at("balance").and_then(value_to_u256)))
	}

	#[instrument(skip(self))]
	async fn claimed_substrate_account(
		&self,
		address: &EvmAddress,
	) -> Result<StorageLookup<SubstrateAccountId>, BlockChainError> {
		if !self.has_storage_entry(UNIFIED_ACCOUNTS_PALLET, "EvmToNative") {
			return Ok(StorageLookup::PalletUnavailable);
		}

		match self
			.fetch(UNIFIED_ACCOUNTS_PALLET, "EvmToNative", address.as_slice())
			.await?
		{
			Some(value) => {
				let bytes: [u8; 32] = value_bytes(&value).try_into().map_err(|bytes: Vec<u8>| {
					BlockChainError::request_error(
						format!("Expected a 32-byte account id, got {} bytes", bytes.len()),
						None,
						None,
					)
				})?;
				Ok(StorageLookup::Found(SubstrateAccountId::new(bytes)))
			}
			None => Ok(StorageLookup::NotFound),
		}
	}

	#[instrument(skip(self))]
	async fn claimed_evm_address(
		&self,
		account_id: &SubstrateAccountId,
	) -> Result<StorageLookup<EvmAddress>, BlockChainError> {
		if !self.has_storage_entry(UNIFIED_ACCOUNTS_PALLET, "NativeToEvm") {
			return Ok(StorageLookup::PalletUnavailable);
		}

		match self
			.fetch(
				UNIFIED_ACCOUNTS_PALLET,
				"NativeToEvm",
				account_id.as_bytes(),
			)
			.await?
		{
			Some(value) => {
				let bytes: [u8; 20] = value_bytes(&value).try_into().map_err(|bytes: Vec<u8>| {
					BlockChainError::request_error(
						format!("Expected a 20-byte EVM address, got {} bytes", bytes.len()),
						None,
						None,
					)
				})?;
				Ok(StorageLookup::Found(EvmAddress::from(bytes)))
			}
			None => Ok(StorageLookup::NotFound),
		}
	}

	#[instrument(skip(self, signer))]
	async fn submit_claim(
		&self,
		signer: &S,
		call: ClaimCall,
	) -> Result<Option<TxStatusStream>, BlockChainError> {
		let name = call.call_name();
		if !self.has_call(UNIFIED_ACCOUNTS_PALLET, name) {
			return Ok(None);
		}

		let fields = match &call {
			ClaimCall::Default => vec![],
			ClaimCall::Explicit {
				evm_address,
				signature,
			} => vec![
				Value::from_bytes(evm_address.as_slice()),
				Value::from_bytes(signature),
			],
		};

		let payload = subxt::dynamic::tx(UNIFIED_ACCOUNTS_PALLET, name, fields);
		let progress = self
			.api
			.tx()
			.sign_and_submit_then_watch_default(&payload, signer)
			.await
			.map_err(|e| {
				BlockChainError::transaction_error(
					format!("Failed to submit {}: {}", name, e),
					Some(Box::new(e)),
					None,
				)
			})?;

		Ok(Some(
			progress
				.filter_map(|status| async move { convert_status(status).await.transpose() })
				.boxed(),
		))
	}
}

/// Maps a subxt status onto the neutral status. Statuses with no counterpart yield `None`.
async fn convert_status(
	status: Result<SubxtTxStatus<SubstrateConfig, Client>, subxt::Error>,
) -> Result<Option<TxStatus>, BlockChainError> {
	match status? {
		SubxtTxStatus::Validated { .. } => Ok(Some(TxStatus::Ready)),
		SubxtTxStatus::Broadcasted { .. } => Ok(Some(TxStatus::Broadcast)),
		SubxtTxStatus::NoLongerInBestBlock { .. } => Ok(None),
		SubxtTxStatus::InBestBlock(tx) => Ok(best_block_status(inclusion(tx).await)),
		SubxtTxStatus::InFinalizedBlock(tx) => {
			Ok(Some(TxStatus::Finalized(inclusion(tx).await?)))
		}
		SubxtTxStatus::Invalid { message } => Ok(Some(TxStatus::Invalid(message))),
		SubxtTxStatus::Dropped { message } => Ok(Some(TxStatus::Dropped(message))),
		SubxtTxStatus::Error { message } => Err(BlockChainError::transaction_error(
			message,
			None,
			None,
		)),
	}
}

/// A best-block inclusion whose events cannot be read is skipped. The finalized status
/// reports the same extrinsic again.
fn best_block_status(inclusion: Result<TxInclusion, BlockChainError>) -> Option<TxStatus> {
	match inclusion {
		Ok(inclusion) => Some(TxStatus::InBlock(inclusion)),
		Err(error) => {
			warn!(error = %error, "Failed to read best block events, waiting for finality");
			None
		}
	}
}

async fn inclusion(tx: TxInBlock<SubstrateConfig, Client>) -> Result<TxInclusion, BlockChainError> {
	let block_hash = format!("0x{}", hex::encode(tx.block_hash()));

	match tx.wait_for_success().await {
		Ok(events) => Ok(TxInclusion {
			block_hash,
			events: chain_events(&events)?,
			dispatch_error: None,
		}),
		Err(subxt::Error::Runtime(dispatch_error)) => Ok(TxInclusion {
			block_hash,
			events: vec![],
			dispatch_error: Some(dispatch_error_details(&dispatch_error)),
		}),
		Err(e) => Err(e.into()),
	}
}

fn chain_events(
	events: &ExtrinsicEvents<SubstrateConfig>,
) -> Result<Vec<ChainEvent>, BlockChainError> {
	events
		.iter()
		.map(|event| chain_event(event?))
		.collect()
}

fn chain_event(event: EventDetails<SubstrateConfig>) -> Result<ChainEvent, BlockChainError> {
	let values = event.field_values().with_context(|| {
		format!(
			"Failed to decode {}.{}",
			event.pallet_name(),
			event.variant_name()
		)
	})?;

	Ok(ChainEvent {
		pallet: event.pallet_name().to_string(),
		variant: event.variant_name().to_string(),
		fields: event_fields(values),
	})
}

fn event_fields<T>(values: Composite<T>) -> Vec<EventField> {
	match values {
		Composite::Named(fields) => fields
			.into_iter()
			.map(|(name, value)| EventField {
				name: Some(name),
				bytes: value_bytes(&value),
			})
			.collect(),
		Composite::Unnamed(values) => values
			.iter()
			.map(|value| EventField {
				name: None,
				bytes: value_bytes(value),
			})
			.collect(),
	}
}

fn dispatch_error_details(error: &DispatchError) -> DispatchErrorDetails {
	if let DispatchError::Module(module_error) = error {
		if let Ok(details) = module_error.details() {
			return module_error_details(
				details.pallet.index(),
				details.pallet.name(),
				details.variant.index,
				&details.variant.name,
				&details.variant.docs,
			);
		}
	}

	// Non-module errors, and module errors missing from the metadata
	DispatchErrorDetails {
		module_index: None,
		error_index: None,
		section: "system".to_string(),
		name: format!("{:?}", error),
		docs: vec![],
	}
}

fn module_error_details(
	pallet_index: u8,
	pallet: &str,
	error_index: u8,
	name: &str,
	docs: &[String],
) -> DispatchErrorDetails {
	DispatchErrorDetails {
		module_index: Some(pallet_index),
		error_index: Some(error_index),
		section: pallet.to_string(),
		name: name.to_string(),
		docs: docs.to_vec(),
	}
}

/// Flattens a byte array, or a newtype around one, into its bytes
fn value_bytes<T>(value: &Value<T>) -> Vec<u8> {
	let mut bytes = Vec::new();
	collect_bytes(value, &mut bytes);
	bytes
}

fn collect_bytes<T>(value: &Value<T>, out: &mut Vec<u8>) {
	match &value.value {
		ValueDef::Composite(composite) => {
			for inner in composite.values() {
				collect_bytes(inner, out);
			}
		}
		ValueDef::Primitive(Primitive::U128(n)) => {
			if let Ok(byte) = u8::try_from(*n) {
				out.push(byte);
			}
		}
		_ => {}
	}
}

fn value_to_u256<T>(value: &Value<T>) -> Option<U256> {
	match &value.value {
		ValueDef::Primitive(Primitive::U128(n)) => Some(U256::from(*n)),
		ValueDef::Primitive(Primitive::U256(bytes)) => Some(U256::from_le_bytes(*bytes)),
		// U256 balances decode as a composite of four little-endian u64 limbs
		ValueDef::Composite(composite) => {
			let limbs = composite
				.values()
				.map(|limb| match &limb.value {
					ValueDef::Primitive(Primitive::U128(n)) => u64::try_from(*n).ok(),
					_ => None,
				})
				.collect::<Option<Vec<u64>>>()?;
			match limbs.as_slice() {
				[single] => Some(U256::from(*single)),
				[a, b, c, d] => Some(U256::from_limbs([*a, *b, *c, *d])),
				_ => None,
			}
		}
		_ => None,
	}
}
