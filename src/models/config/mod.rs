//! Configuration loading and validation.
//!
//! Network configurations are stored as JSON files. The [`ConfigLoader`] trait is the
//! common interface for reading and validating them.

use std::path::Path;

mod error;
mod network_config;

pub use error::ConfigError;
pub use network_config::{
	NetworkConfig, NetworkConfigFile, EVM_CHAIN_ID_ENV, RPC_URL_ENV, SS58_PREFIX_ENV,
};

/// Common interface for loading configuration files
pub trait ConfigLoader: Sized {
	/// Load all configuration files from a directory
	///
	/// If no path is provided, uses the default config directory.
	fn load_all<T>(path: Option<&Path>) -> Result<T, Box<ConfigError>>
	where
		T: FromIterator<(String, Self)>;

	/// Load configuration from a specific file path
	fn load_from_path(path: &Path) -> Result<Self, Box<ConfigError>>;

	/// Validate the configuration
	fn validate(&self) -> Result<(), Box<ConfigError>>;

	/// Check if a file is a JSON file based on extension
	fn is_json_file(path: &Path) -> bool {
		path.is_file()
			&& path
				.extension()
				.map(|ext| ext.eq_ignore_ascii_case("json"))
				.unwrap_or(false)
	}
}
