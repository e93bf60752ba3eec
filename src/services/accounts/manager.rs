//! Unified account manager.
//!
//! Combines the address codec, the signing payload builder and a
//! [`SubstrateTransport`] into the account-level operations: balance aggregation,
//! authoritative mapping lookups and claim submission.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::U256;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
	models::{
		AddressFormat, AddressKind, AddressPair, AddressType, AddressValidation, ClaimCall,
		ClaimFinality, ClaimOutcome, ClaimedMapping, DerivedEvmAddress, DerivedSubstrateAddress,
		EvmAddress, NetworkConfig, StorageLookup, SubstrateAccountId, SubstrateBalance,
		TargetFormat, TxInclusion, TxStatus, UnifiedAccountInfo, UnifiedAddress, UnifiedBalance,
		EVM_SIGNATURE_LEN, SELENDRA_SS58_PREFIX,
	},
	services::{
		accounts::AccountError,
		blockchain::{BlockChainError, SubstrateTransport, TxStatusStream},
		codec::{
			decode_substrate_address, decode_substrate_address_with_prefix, encode_evm_address,
			is_evm_address_format, is_substrate_address_format, parse_evm_address,
		},
		signing::{signing_payload_hex, ClaimDomain},
	},
};

const UNIFIED_ACCOUNTS_PALLET: &str = "UnifiedAccounts";
const ACCOUNT_CLAIMED_EVENT: &str = "AccountClaimed";

/// Account-level operations over a Substrate node hosting an EVM.
///
/// Holds no mutable state. The transport is shared, and concurrent claims are
/// ordered by the node's transaction pool.
pub struct UnifiedAccountManager<T: SubstrateTransport> {
	transport: Arc<T>,
	network_prefix: u16,
	claim_domain: ClaimDomain,
	finality: ClaimFinality,
}

impl<T: SubstrateTransport> Clone for UnifiedAccountManager<T> {
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			network_prefix: self.network_prefix,
			claim_domain: self.claim_domain.clone(),
			finality: self.finality,
		}
	}
}

impl<T: SubstrateTransport> UnifiedAccountManager<T> {
	/// Creates a manager for the network described by `network`
	pub fn new(transport: Arc<T>, network: &NetworkConfig) -> Self {
		Self {
			transport,
			network_prefix: network.ss58_prefix,
			claim_domain: ClaimDomain::from(network),
			finality: network.finality,
		}
	}

	/// Creates a manager with the Selendra prefix, the default claim domain and
	/// finalized claims
	pub fn with_transport(transport: Arc<T>) -> Self {
		Self {
			transport,
			network_prefix: SELENDRA_SS58_PREFIX,
			claim_domain: ClaimDomain::default(),
			finality: ClaimFinality::Finalized,
		}
	}

	pub fn network_prefix(&self) -> u16 {
		self.network_prefix
	}

	pub fn claim_domain(&self) -> &ClaimDomain {
		&self.claim_domain
	}

	pub fn finality(&self) -> ClaimFinality {
		self.finality
	}

	/// Parses an SS58 or `0x` address using the manager's prefix
	pub fn create_address(&self, address: &str) -> Result<UnifiedAddress, AccountError> {
		UnifiedAddress::new(address, self.network_prefix)
	}

	/// Truncates an SS58 account to its derived EVM address
	pub fn substrate_to_evm(&self, address: &str) -> Result<DerivedEvmAddress, AccountError> {
		let account_id = decode_substrate_address(address.trim())?;
		Ok(DerivedEvmAddress::from_account_id(&account_id))
	}

	/// Zero-pads an EVM address to its derived Substrate account
	pub fn evm_to_substrate(&self, address: &str) -> Result<DerivedSubstrateAddress, AccountError> {
		let evm_address = parse_evm_address(address.trim())?;
		DerivedSubstrateAddress::from_evm_address(&evm_address, self.network_prefix)
	}

	/// Balances of the derived Substrate account and the derived EVM account.
	///
	/// An EVM balance that is absent or fails to load counts as zero. Failures
	/// reading the Substrate account are returned.
	#[instrument(skip(self))]
	pub async fn get_unified_balance(&self, address: &str) -> Result<UnifiedBalance, AccountError> {
		let unified = self.create_address(address)?;
		self.balance_of(&unified).await
	}

	/// True iff both the Substrate free balance and the EVM balance are positive
	pub async fn has_unified_balance(&self, address: &str) -> Result<bool, AccountError> {
		Ok(self.get_unified_balance(address).await?.is_unified())
	}

	async fn balance_of(&self, unified: &UnifiedAddress) -> Result<UnifiedBalance, AccountError> {
		let account = self
			.transport
			.account_data(unified.substrate_account_id())
			.await?
			.unwrap_or_default();

		let evm = match self
			.transport
			.evm_account_balance(unified.evm_address())
			.await
		{
			Ok(Some(balance)) => balance,
			Ok(None) => {
				debug!(evm = %unified.to_evm(), "No EVM account, counting balance as zero");
				U256::ZERO
			}
			Err(error) => {
				debug!(evm = %unified.to_evm(), error = %error, "EVM balance query failed, counting as zero");
				U256::ZERO
			}
		};

		Ok(UnifiedBalance::new(
			SubstrateBalance {
				free: account.free,
				reserved: account.reserved,
				frozen: account.frozen,
			},
			evm,
		))
	}

	/// Classifies an address without touching the network
	pub fn validate_address(&self, address: &str) -> AddressValidation {
		let address = address.trim();
		let address_type = if address.is_empty() {
			AddressType::Invalid
		} else if is_evm_address_format(address) {
			AddressType::Evm
		} else if is_substrate_address_format(address) {
			AddressType::Substrate
		} else {
			AddressType::Invalid
		};

		AddressValidation {
			valid: address_type != AddressType::Invalid,
			address_type,
		}
	}

	/// Converts every address to `format`, stopping at the first malformed entry
	pub fn batch_convert<S: AsRef<str>>(
		&self,
		addresses: &[S],
		format: AddressFormat,
	) -> Result<Vec<String>, AccountError> {
		addresses
			.iter()
			.enumerate()
			.map(|(index, address)| -> Result<String, AccountError> {
				let unified = self.create_address(address.as_ref()).map_err(|e| {
					AccountError::invalid_address(
						format!("Invalid address at index {}", index),
						Some(HashMap::from([
							("index".to_string(), index.to_string()),
							("address".to_string(), address.as_ref().to_string()),
							("reason".to_string(), e.to_string()),
						])),
					)
				})?;
				Ok(match format {
					AddressFormat::Substrate => unified.to_substrate(),
					AddressFormat::Evm => unified.to_evm(),
				})
			})
			.collect()
	}

	/// Authoritative mapping claimed for an EVM address
	#[instrument(skip(self))]
	pub async fn claimed_mapping_for_evm(
		&self,
		evm_address: &str,
	) -> Result<Option<ClaimedMapping>, AccountError> {
		let evm_address = parse_evm_address(evm_address.trim())?;
		self.mapping_for_evm_address(&evm_address).await
	}

	/// Authoritative mapping claimed by a Substrate account
	#[instrument(skip(self))]
	pub async fn claimed_mapping_for_substrate(
		&self,
		substrate_address: &str,
	) -> Result<Option<ClaimedMapping>, AccountError> {
		let (account_id, _) = decode_substrate_address_with_prefix(substrate_address.trim())?;
		self.mapping_for_account_id(&account_id).await
	}

	/// SS58 form of the account that claimed `evm_address`, if any
	pub async fn get_substrate_address_from_mapping(
		&self,
		evm_address: &str,
	) -> Result<Option<String>, AccountError> {
		self.claimed_mapping_for_evm(evm_address)
			.await?
			.map(|mapping| mapping.account_id.to_ss58(self.network_prefix))
			.transpose()
	}

	/// EVM address claimed by `substrate_address`, if any
	pub async fn get_evm_address_from_mapping(
		&self,
		substrate_address: &str,
	) -> Result<Option<String>, AccountError> {
		Ok(self
			.claimed_mapping_for_substrate(substrate_address)
			.await?
			.map(|mapping| encode_evm_address(&mapping.evm_address)))
	}

	/// True if a claimed mapping exists for the address, in whichever form it was given
	pub async fn has_mapping_on_chain(&self, address: &str) -> Result<bool, AccountError> {
		let unified = self.create_address(address)?;
		let mapping = match unified.kind() {
			AddressKind::Evm => self.mapping_for_evm_address(unified.evm_address()).await?,
			AddressKind::Substrate => {
				self.mapping_for_account_id(unified.substrate_account_id())
					.await?
			}
		};
		Ok(mapping.is_some())
	}

	async fn mapping_for_evm_address(
		&self,
		evm_address: &EvmAddress,
	) -> Result<Option<ClaimedMapping>, AccountError> {
		let lookup = self.transport.claimed_substrate_account(evm_address).await?;
		Ok(found_or_log(lookup).map(|account_id| ClaimedMapping {
			account_id,
			evm_address: *evm_address,
		}))
	}

	async fn mapping_for_account_id(
		&self,
		account_id: &SubstrateAccountId,
	) -> Result<Option<ClaimedMapping>, AccountError> {
		let lookup = self.transport.claimed_evm_address(account_id).await?;
		Ok(found_or_log(lookup).map(|evm_address| ClaimedMapping {
			account_id: *account_id,
			evm_address,
		}))
	}

	/// Balances, derived forms and claimed mapping of an address
	#[instrument(skip(self))]
	pub async fn get_account_info(&self, address: &str) -> Result<UnifiedAccountInfo, AccountError> {
		let unified = self.create_address(address)?;
		let balance = self.balance_of(&unified).await?;
		let mapping = match unified.kind() {
			AddressKind::Evm => self.mapping_for_evm_address(unified.evm_address()).await?,
			AddressKind::Substrate => {
				self.mapping_for_account_id(unified.substrate_account_id())
					.await?
			}
		};
		let claimed = mapping
			.map(|mapping| -> Result<AddressPair, AccountError> {
				Ok(AddressPair {
					substrate: mapping.account_id.to_ss58(self.network_prefix)?,
					evm: encode_evm_address(&mapping.evm_address),
				})
			})
			.transpose()?;

		Ok(UnifiedAccountInfo {
			address: unified.get_both(),
			exists: !balance.is_empty() || mapping.is_some(),
			balance,
			claimed,
			mapping,
		})
	}

	/// True if the two addresses are related by derivation.
	///
	/// Two Substrate accounts must be identical. A Substrate account and an EVM address
	/// match when truncating the account gives the address.
	pub fn are_same_entity(&self, first: &str, second: &str) -> Result<bool, AccountError> {
		let first = self.create_address(first)?;
		let second = self.create_address(second)?;
		Ok(match (first.kind(), second.kind()) {
			(AddressKind::Substrate, AddressKind::Substrate) => {
				first.substrate_account_id() == second.substrate_account_id()
			}
			_ => first.evm_address() == second.evm_address(),
		})
	}

	/// Renders an address in another text form
	pub fn convert_address_format(
		&self,
		address: &str,
		target: TargetFormat,
	) -> Result<String, AccountError> {
		let unified = self.create_address(address)?;
		match target {
			TargetFormat::Hex => Ok(format!(
				"0x{}",
				hex::encode(unified.substrate_account_id().as_bytes())
			)),
			TargetFormat::Ss58 => unified
				.substrate_account_id()
				.to_ss58(self.network_prefix),
			TargetFormat::Ethereum => Ok(unified.to_evm()),
		}
	}

	/// Digest the owner of an EVM key signs to let `substrate_address` claim it
	pub fn build_signing_payload(&self, substrate_address: &str) -> Result<String, AccountError> {
		let account_id = decode_substrate_address(substrate_address.trim())?;
		Ok(signing_payload_hex(&account_id, &self.claim_domain))
	}

	/// Binds the signer to its truncation-derived EVM address
	#[instrument(skip(self, signer, cancel))]
	pub async fn claim_default_evm_address(
		&self,
		signer: &T::Signer,
		cancel: Option<watch::Receiver<bool>>,
	) -> Result<ClaimOutcome, AccountError> {
		info!("Submitting default EVM address claim");
		let statuses = self.submit(signer, ClaimCall::Default).await?;
		self.await_claim(statuses, cancel).await
	}

	/// Binds the signer to `evm_address`.
	///
	/// `evm_signature` is the 65-byte signature, as hex with an optional `0x`, made by
	/// the EVM key over [`build_signing_payload`](Self::build_signing_payload) for the
	/// signer's account. Both inputs are checked before anything is submitted.
	#[instrument(skip(self, signer, evm_signature, cancel))]
	pub async fn claim_evm_address(
		&self,
		signer: &T::Signer,
		evm_address: &str,
		evm_signature: &str,
		cancel: Option<watch::Receiver<bool>>,
	) -> Result<ClaimOutcome, AccountError> {
		let evm_address = parse_evm_address(evm_address.trim())?;
		let signature = parse_evm_signature(evm_signature)?;

		info!(evm = %encode_evm_address(&evm_address), "Submitting EVM address claim");
		let statuses = self
			.submit(
				signer,
				ClaimCall::Explicit {
					evm_address,
					signature,
				},
			)
			.await?;
		self.await_claim(statuses, cancel).await
	}

	async fn submit(
		&self,
		signer: &T::Signer,
		call: ClaimCall,
	) -> Result<TxStatusStream, AccountError> {
		let name = call.call_name();
		self.transport.submit_claim(signer, call).await?.ok_or_else(|| {
			warn!(call = name, "Claim call is not part of the runtime");
			AccountError::pallet_unavailable(
				"Claim call is not part of the runtime",
				Some(HashMap::from([(
					"call".to_string(),
					format!("{}.{}", UNIFIED_ACCOUNTS_PALLET, name),
				)])),
			)
		})
	}

	/// Follows the status stream until the claim settles, fails or is cancelled.
	/// The stream is dropped on every return path.
	async fn await_claim(
		&self,
		mut statuses: TxStatusStream,
		cancel: Option<watch::Receiver<bool>>,
	) -> Result<ClaimOutcome, AccountError> {
		let cancelled = wait_for_cancel(cancel);
		tokio::pin!(cancelled);

		loop {
			let status = tokio::select! {
				biased;
				_ = &mut cancelled => {
					warn!("Claim cancelled before it settled");
					return Err(AccountError::cancelled(
						"Stopped waiting for the claim to settle",
						None,
					));
				}
				status = statuses.next() => status,
			};

			match status {
				Some(Ok(TxStatus::Ready)) => debug!("Claim ready in the transaction pool"),
				Some(Ok(TxStatus::Broadcast)) => debug!("Claim broadcast to peers"),
				Some(Ok(TxStatus::InBlock(inclusion))) => {
					if self.finality == ClaimFinality::InBlock {
						return self.claim_outcome(inclusion);
					}
					debug!(block_hash = %inclusion.block_hash, "Claim included, waiting for finality");
				}
				Some(Ok(TxStatus::Finalized(inclusion))) => return self.claim_outcome(inclusion),
				Some(Ok(TxStatus::Invalid(reason))) => {
					return Err(rejected("Invalid", reason));
				}
				Some(Ok(TxStatus::Dropped(reason))) => {
					return Err(rejected("Dropped", reason));
				}
				Some(Ok(TxStatus::Usurped(reason))) => {
					return Err(rejected("Usurped", reason));
				}
				Some(Err(error)) => return Err(error.into()),
				None => {
					return Err(BlockChainError::transaction_error(
						"Status stream ended before the claim settled",
						None,
						None,
					)
					.into());
				}
			}
		}
	}

	fn claim_outcome(&self, inclusion: TxInclusion) -> Result<ClaimOutcome, AccountError> {
		if let Some(details) = &inclusion.dispatch_error {
			warn!(
				block_hash = %inclusion.block_hash,
				section = %details.section,
				name = %details.name,
				"Claim dispatch failed"
			);
			return Err(AccountError::claim_failed(details));
		}

		let missing = |reason: &str| {
			AccountError::claim_event_missing(
				reason,
				Some(HashMap::from([(
					"block_hash".to_string(),
					inclusion.block_hash.clone(),
				)])),
			)
		};

		let event = inclusion
			.events
			.iter()
			.find(|event| event.is(UNIFIED_ACCOUNTS_PALLET, ACCOUNT_CLAIMED_EVENT))
			.ok_or_else(|| missing("No UnifiedAccounts.AccountClaimed event in the block"))?;

		let account_id: [u8; 32] = event
			.field("account_id", 0)
			.and_then(|field| field.bytes.as_slice().try_into().ok())
			.ok_or_else(|| missing("AccountClaimed event has no 32-byte account id"))?;
		let evm_address: [u8; 20] = event
			.field("evm_address", 1)
			.and_then(|field| field.bytes.as_slice().try_into().ok())
			.ok_or_else(|| missing("AccountClaimed event has no 20-byte EVM address"))?;

		let mapping = ClaimedMapping {
			account_id: SubstrateAccountId::new(account_id),
			evm_address: EvmAddress::from(evm_address),
		};
		info!(block_hash = %inclusion.block_hash, "Claim settled");

		Ok(ClaimOutcome {
			account_id: mapping.account_id.to_ss58(self.network_prefix)?,
			evm_address: encode_evm_address(&mapping.evm_address),
			block_hash: inclusion.block_hash.clone(),
			mapping,
		})
	}
}

fn found_or_log<V>(lookup: StorageLookup<V>) -> Option<V> {
	if matches!(lookup, StorageLookup::PalletUnavailable) {
		debug!("UnifiedAccounts pallet is not part of the runtime");
	}
	lookup.found()
}

fn rejected(status: &str, reason: String) -> AccountError {
	BlockChainError::transaction_error(
		format!("Claim {}: {}", status.to_lowercase(), reason),
		None,
		Some(HashMap::from([("status".to_string(), status.to_string())])),
	)
	.into()
}

/// Parses a 65-byte signature given as 130 hex characters, optionally `0x`-prefixed
fn parse_evm_signature(signature: &str) -> Result<[u8; EVM_SIGNATURE_LEN], AccountError> {
	let signature = signature.trim();
	let digits = signature.strip_prefix("0x").unwrap_or(signature);

	let mut bytes = [0u8; EVM_SIGNATURE_LEN];
	if digits.len() != EVM_SIGNATURE_LEN * 2 || hex::decode_to_slice(digits, &mut bytes).is_err() {
		return Err(AccountError::invalid_signature_format(
			format!(
				"Expected {} hex characters, optionally 0x-prefixed",
				EVM_SIGNATURE_LEN * 2
			),
			Some(HashMap::from([(
				"length".to_string(),
				digits.len().to_string(),
			)])),
		));
	}
	Ok(bytes)
}

/// Resolves once the receiver observes `true`. Never resolves without a receiver,
/// or when the sender goes away before cancelling.
async fn wait_for_cancel(cancel: Option<watch::Receiver<bool>>) {
	if let Some(mut receiver) = cancel {
		let cancelled = receiver.wait_for(|cancelled| *cancelled).await.is_ok();
		if cancelled {
			return;
		}
	}
	std::future::pending::<()>().await
}
