//! Network configuration loading and validation.
//!
//! A [`NetworkConfig`] names one Substrate/EVM network: where to reach its node, the
//! SS58 prefix its addresses are rendered with, and the EIP-712 domain its claim
//! payloads are bound to. Configurations are read from JSON files and can be adjusted
//! through `SELENDRA_*` environment variables.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use crate::models::{
	config::error::ConfigError, ClaimFinality, ConfigLoader, GENERIC_SUBSTRATE_SS58_PREFIX,
	SELENDRA_SS58_PREFIX,
};

/// Overrides the node endpoint
pub const RPC_URL_ENV: &str = "SELENDRA_RPC_URL";
/// Overrides the SS58 prefix
pub const SS58_PREFIX_ENV: &str = "SELENDRA_SS58_PREFIX";
/// Overrides the EVM chain id used in claim payloads
pub const EVM_CHAIN_ID_ENV: &str = "SELENDRA_EVM_CHAIN_ID";

const DEFAULT_CLAIM_DOMAIN_NAME: &str = "Selendra EVM Claim";
const DEFAULT_CLAIM_DOMAIN_VERSION: &str = "1";
const MAX_SS58_PREFIX: u16 = 16383;

/// Configuration of one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
	/// Human readable name
	pub name: String,
	/// Short identifier, lowercase
	pub slug: String,
	/// Websocket endpoint of a Substrate node
	pub rpc_url: String,
	/// Prefix used when rendering SS58 addresses
	pub ss58_prefix: u16,
	/// Chain id bound into the claim signing domain
	pub evm_chain_id: u64,
	#[serde(default = "default_claim_domain_name")]
	pub claim_domain_name: String,
	#[serde(default = "default_claim_domain_version")]
	pub claim_domain_version: String,
	/// When a submitted claim counts as settled
	#[serde(default)]
	pub finality: ClaimFinality,
}

fn default_claim_domain_name() -> String {
	DEFAULT_CLAIM_DOMAIN_NAME.to_string()
}

fn default_claim_domain_version() -> String {
	DEFAULT_CLAIM_DOMAIN_VERSION.to_string()
}

/// File structure for network configuration files
#[derive(Debug, Deserialize)]
pub struct NetworkConfigFile {
	/// Map of network slugs to their configurations
	#[serde(flatten)]
	pub networks: HashMap<String, NetworkConfig>,
}

impl NetworkConfig {
	/// Selendra mainnet
	pub fn selendra_mainnet() -> Self {
		Self {
			name: "Selendra".to_string(),
			slug: "selendra".to_string(),
			rpc_url: "wss://rpc.selendra.org".to_string(),
			ss58_prefix: SELENDRA_SS58_PREFIX,
			evm_chain_id: 1961,
			claim_domain_name: default_claim_domain_name(),
			claim_domain_version: default_claim_domain_version(),
			finality: ClaimFinality::Finalized,
		}
	}

	/// Selendra testnet. Shares the mainnet SS58 prefix.
	pub fn selendra_testnet() -> Self {
		Self {
			name: "Selendra Testnet".to_string(),
			slug: "selendra_testnet".to_string(),
			rpc_url: "wss://rpc-testnet.selendra.org".to_string(),
			evm_chain_id: 1953,
			..Self::selendra_mainnet()
		}
	}

	/// Local development node using the generic Substrate prefix
	pub fn generic_substrate() -> Self {
		Self {
			name: "Substrate".to_string(),
			slug: "substrate".to_string(),
			rpc_url: "ws://127.0.0.1:9944".to_string(),
			ss58_prefix: GENERIC_SUBSTRATE_SS58_PREFIX,
			evm_chain_id: 1961,
			claim_domain_name: default_claim_domain_name(),
			claim_domain_version: default_claim_domain_version(),
			finality: ClaimFinality::InBlock,
		}
	}

	/// Applies `SELENDRA_*` overrides from the process environment, reading a `.env`
	/// file first when one exists
	pub fn with_env_overrides(self) -> Result<Self, Box<ConfigError>> {
		dotenvy::dotenv().ok();
		self.with_overrides(|key| std::env::var(key).ok())
	}

	/// Applies `SELENDRA_*` overrides read through `lookup`, then validates the result
	pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, Box<ConfigError>>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(rpc_url) = lookup(RPC_URL_ENV) {
			self.rpc_url = rpc_url;
		}
		if let Some(prefix) = lookup(SS58_PREFIX_ENV) {
			self.ss58_prefix = prefix.trim().parse().map_err(|e| {
				ConfigError::parse_error(
					format!("Invalid {}", SS58_PREFIX_ENV),
					Some(Box::new(e)),
					Some(HashMap::from([("value".to_string(), prefix.clone())])),
				)
			})?;
		}
		if let Some(chain_id) = lookup(EVM_CHAIN_ID_ENV) {
			self.evm_chain_id = chain_id.trim().parse().map_err(|e| {
				ConfigError::parse_error(
					format!("Invalid {}", EVM_CHAIN_ID_ENV),
					Some(Box::new(e)),
					Some(HashMap::from([("value".to_string(), chain_id.clone())])),
				)
			})?;
		}

		self.validate()?;
		Ok(self)
	}
}

impl ConfigLoader for NetworkConfig {
	/// Load all network configurations from a directory
	///
	/// Reads and parses all JSON files in the specified directory (or default
	/// config directory) as network configurations.
	fn load_all<T>(path: Option<&Path>) -> Result<T, Box<ConfigError>>
	where
		T: FromIterator<(String, Self)>,
	{
		let config_dir = path.unwrap_or(Path::new("config/networks"));
		let entries = fs::read_dir(config_dir).map_err(|e| {
			ConfigError::file_error(
				"Failed to read networks directory",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					config_dir.display().to_string(),
				)])),
			)
		})?;

		let mut network_pairs = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| {
				ConfigError::file_error("Failed to read networks directory", Some(Box::new(e)), None)
			})?;
			if !Self::is_json_file(&entry.path()) {
				continue;
			}

			let content = fs::read_to_string(entry.path()).map_err(|e| {
				ConfigError::file_error("Failed to read network file", Some(Box::new(e)), None)
			})?;
			let file_networks: NetworkConfigFile = serde_json::from_str(&content).map_err(|e| {
				ConfigError::parse_error(
					"Failed to parse network file",
					Some(Box::new(e)),
					Some(HashMap::from([(
						"path".to_string(),
						entry.path().display().to_string(),
					)])),
				)
			})?;

			for (name, network) in file_networks.networks {
				if let Err(validation_error) = network.validate() {
					return Err(Box::new(ConfigError::validation_error(
						format!(
							"Validation failed for network '{}': {}",
							name, validation_error
						),
						None,
					)));
				}
				network_pairs.push((name, network));
			}
		}
		Ok(T::from_iter(network_pairs))
	}

	/// Load a network configuration from a specific file
	fn load_from_path(path: &Path) -> Result<Self, Box<ConfigError>> {
		let file = fs::File::open(path).map_err(|e| {
			ConfigError::file_error("Failed to open file", Some(Box::new(e)), None)
		})?;
		let config: NetworkConfig = serde_json::from_reader(file).map_err(|e| {
			ConfigError::parse_error("Failed to parse file", Some(Box::new(e)), None)
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Validate the network configuration
	///
	/// Ensures that:
	/// - The name and slug are present, the slug lowercase
	/// - The RPC URL parses and uses a ws, wss, http or https scheme
	/// - The SS58 prefix fits the two-byte encoding
	/// - The claim domain is complete
	fn validate(&self) -> Result<(), Box<ConfigError>> {
		if self.name.trim().is_empty() {
			return Err(Box::new(ConfigError::validation_error(
				"Network name cannot be empty",
				None,
			)));
		}

		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
		{
			return Err(Box::new(ConfigError::validation_error(
				"Slug must be non-empty and contain only lowercase letters, digits, '_' or '-'",
				Some(HashMap::from([("slug".to_string(), self.slug.clone())])),
			)));
		}

		let rpc_url = url::Url::parse(&self.rpc_url).map_err(|e| {
			Box::new(ConfigError::validation_error(
				format!("Invalid RPC URL: {}", e),
				Some(HashMap::from([(
					"rpc_url".to_string(),
					self.rpc_url.clone(),
				)])),
			))
		})?;
		if !matches!(rpc_url.scheme(), "ws" | "wss" | "http" | "https") {
			return Err(Box::new(ConfigError::validation_error(
				format!("Unsupported RPC URL scheme: {}", rpc_url.scheme()),
				Some(HashMap::from([(
					"rpc_url".to_string(),
					self.rpc_url.clone(),
				)])),
			)));
		}

		if self.ss58_prefix > MAX_SS58_PREFIX {
			return Err(Box::new(ConfigError::validation_error(
				format!("SS58 prefix must be at most {}", MAX_SS58_PREFIX),
				Some(HashMap::from([(
					"ss58_prefix".to_string(),
					self.ss58_prefix.to_string(),
				)])),
			)));
		}

		if self.evm_chain_id == 0 {
			return Err(Box::new(ConfigError::validation_error(
				"EVM chain id cannot be zero",
				None,
			)));
		}

		if self.claim_domain_name.trim().is_empty() || self.claim_domain_version.trim().is_empty()
		{
			return Err(Box::new(ConfigError::validation_error(
				"Claim domain name and version cannot be empty",
				None,
			)));
		}

		Ok(())
	}
}
