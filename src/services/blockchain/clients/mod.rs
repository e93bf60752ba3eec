//! Blockchain client implementations.
//!
//! Contains the transport implementations for Substrate nodes:
//! - SubxtTransport, built on the `subxt` dynamic API
mod substrate {
	pub mod client;
}

pub use substrate::client::SubxtTransport;
