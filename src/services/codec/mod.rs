//! Address codec.
//!
//! Stateless conversions between the text and byte forms of Substrate account ids
//! (SS58) and EVM addresses (hex). Nothing here touches the network.

mod evm;
mod ss58;

pub use evm::{encode_evm_address, is_evm_address_format, parse_evm_address};
pub use ss58::{
	decode_substrate_address, decode_substrate_address_with_prefix, encode_substrate_address,
	is_substrate_address_format, substrate_address_has_prefix,
};
