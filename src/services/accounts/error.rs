//! Account error types.
//!
//! Every failure surfaced by the codec, the signing payload builder and the
//! [`UnifiedAccountManager`](super::UnifiedAccountManager) is an [`AccountError`].
//! Callers branch on the variant: input errors warrant prompting the user again,
//! claim failures need escalation, transport errors come straight from the node.

use std::collections::HashMap;

use thiserror::Error as ThisError;

use crate::{
	models::DispatchErrorDetails,
	services::blockchain::BlockChainError,
	utils::{ErrorContext, TraceableError},
};

/// Errors produced by unified account operations
#[derive(ThisError, Debug)]
pub enum AccountError {
	/// Caller-supplied address failed a format or checksum check
	#[error("Invalid address: {0}")]
	InvalidAddress(Box<ErrorContext>),

	/// Caller-supplied EVM signature is not 65 bytes of hex
	#[error("Invalid signature format: {0}")]
	InvalidSignatureFormat(Box<ErrorContext>),

	/// The claim extrinsic was included but dispatch failed
	#[error("Claim failed: {section}.{name}{}", format_docs(.docs))]
	ClaimFailed {
		section: String,
		name: String,
		docs: Vec<String>,
	},

	/// The claim extrinsic succeeded but the expected event was not emitted
	#[error("Claim event missing: {0}")]
	ClaimEventMissing(Box<ErrorContext>),

	/// A required pallet or storage entry is not part of the runtime
	#[error("Pallet unavailable: {0}")]
	PalletUnavailable(Box<ErrorContext>),

	/// The caller cancelled while waiting for the claim to resolve
	#[error("Claim cancelled: {0}")]
	Cancelled(Box<ErrorContext>),

	/// Transport failure reported by the node connection
	#[error(transparent)]
	Transport(#[from] BlockChainError),
}

fn format_docs(docs: &[String]) -> String {
	if docs.is_empty() {
		String::new()
	} else {
		format!(" ({})", docs.join(" "))
	}
}

impl AccountError {
	/// Creates a new invalid address error
	pub fn invalid_address(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidAddress(Box::new(ErrorContext::new(msg, None, metadata)))
	}

	/// Creates a new invalid signature format error
	pub fn invalid_signature_format(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidSignatureFormat(Box::new(ErrorContext::new(msg, None, metadata)))
	}

	/// Creates a claim failure from a decoded dispatch error
	pub fn claim_failed(details: &DispatchErrorDetails) -> Self {
		Self::ClaimFailed {
			section: details.section.clone(),
			name: details.name.clone(),
			docs: details.docs.clone(),
		}
	}

	/// Creates a new claim event missing error
	pub fn claim_event_missing(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ClaimEventMissing(Box::new(ErrorContext::new(msg, None, metadata)))
	}

	/// Creates a new pallet unavailable error
	pub fn pallet_unavailable(
		msg: impl Into<String>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::PalletUnavailable(Box::new(ErrorContext::new(msg, None, metadata)))
	}

	/// Creates a new cancellation error
	pub fn cancelled(msg: impl Into<String>, metadata: Option<HashMap<String, String>>) -> Self {
		Self::Cancelled(Box::new(ErrorContext::new(msg, None, metadata)))
	}

	/// Returns true for errors caused by caller-supplied data, detected before any I/O
	pub fn is_input_error(&self) -> bool {
		matches!(
			self,
			Self::InvalidAddress(_) | Self::InvalidSignatureFormat(_)
		)
	}

	/// Returns the error context, when the variant carries one
	pub fn context(&self) -> Option<&ErrorContext> {
		match self {
			Self::InvalidAddress(ctx)
			| Self::InvalidSignatureFormat(ctx)
			| Self::ClaimEventMissing(ctx)
			| Self::PalletUnavailable(ctx)
			| Self::Cancelled(ctx) => Some(ctx),
			Self::ClaimFailed { .. } | Self::Transport(_) => None,
		}
	}

	/// Returns the trace id linking this error to the operation that raised it
	pub fn trace_id(&self) -> Option<String> {
		match self {
			Self::Transport(err) => Some(err.trace_id()),
			other => other.context().map(|ctx| ctx.trace_id.clone()),
		}
	}
}
