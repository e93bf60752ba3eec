//! Blockchain error types and handling.
//!
//! Errors raised by a [`SubstrateTransport`](super::SubstrateTransport) implementation:
//! connectivity problems, malformed requests or responses, transaction pool rejections
//! and internal decoding failures.

use crate::utils::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents possible errors that can occur during blockchain operations
#[derive(ThisError, Debug)]
pub enum BlockChainError {
	/// Errors related to network connectivity issues
	#[error("Connection error: {0}")]
	ConnectionError(Box<ErrorContext>),

	/// Errors related to malformed requests or invalid responses
	#[error("Request error: {0}")]
	RequestError(Box<ErrorContext>),

	/// Errors related to transaction processing
	#[error("Transaction error: {0}")]
	TransactionError(Box<ErrorContext>),

	/// Internal errors within the blockchain client
	#[error("Internal error: {0}")]
	InternalError(Box<ErrorContext>),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl BlockChainError {
	/// Creates a new connection error
	pub fn connection_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectionError(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	/// Creates a new request error
	pub fn request_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestError(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	/// Creates a new transaction error
	pub fn transaction_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::TransactionError(Box::new(ErrorContext::new(msg, source, metadata)))
	}

	/// Creates a new internal error
	pub fn internal_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InternalError(Box::new(ErrorContext::new(msg, source, metadata)))
	}
}

impl TraceableError for BlockChainError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConnectionError(ctx) => ctx.trace_id.clone(),
			Self::RequestError(ctx) => ctx.trace_id.clone(),
			Self::TransactionError(ctx) => ctx.trace_id.clone(),
			Self::InternalError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => uuid::Uuid::new_v4().to_string(),
		}
	}
}

impl From<subxt::Error> for BlockChainError {
	fn from(err: subxt::Error) -> Self {
		Self::request_error(err.to_string(), Some(Box::new(err)), None)
	}
}
