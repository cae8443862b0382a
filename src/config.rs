//! Configuration Module
//!
//! This module defines all configuration structures for the admission pipeline.
//! Configuration is loaded from TOML files and parsed using serde. Every
//! section has defaults, so a partial file is valid.
//!
//! # Example TOML
//! ```toml
//! chain_id = "admission-1"
//!
//! [params]
//! max_memo_characters = 256
//! tx_sig_limit = 7
//!
//! [fees]
//! min_gas_prices = ["0.025stake"]
//!
//! [unordered]
//! enabled = true
//! max_timeout_secs = 600
//! ```

use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::coins::GasPrice;
use crate::error::ConfigurationError;
use crate::types::SignMode;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chain_id: String,
    pub params: Params,
    pub fees: FeeConfig,
    pub unordered: UnorderedConfig,
    pub signing: SigningConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: "admission-1".to_string(),
            params: Params::default(),
            fees: FeeConfig::default(),
            unordered: UnorderedConfig::default(),
            signing: SigningConfig::default(),
        }
    }
}

/// Consensus-level pipeline parameters.
///
/// Every node must run with the same values; they determine admission and gas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Longest memo accepted, in bytes.
    pub max_memo_characters: u64,
    /// Maximum number of signatures (multisig members counted individually).
    pub tx_sig_limit: u64,
    /// Gas charged per encoded transaction byte.
    pub tx_size_cost_per_byte: u64,
    /// Gas charged per signer for validating the memo.
    pub memo_gas_per_signer: u64,
    pub sig_verify_cost_ed25519: u64,
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            memo_gas_per_signer: 10,
            sig_verify_cost_ed25519: 590,
            sig_verify_cost_secp256k1: 1000,
        }
    }
}

/// Node-local fee policy
///
/// # Fields
/// - `min_gas_prices`: Prices such as `"0.025stake"`; empty disables the check
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeeConfig {
    pub min_gas_prices: Vec<String>,
}

impl FeeConfig {
    pub fn parsed_min_gas_prices(&self) -> Result<Vec<GasPrice>, ConfigurationError> {
        self.min_gas_prices
            .iter()
            .map(|s| s.parse::<GasPrice>().map_err(ConfigurationError::Invalid))
            .collect()
    }
}

/// Unordered (nonce-window) replay protection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnorderedConfig {
    pub enabled: bool,
    /// Furthest a timeout timestamp may sit past the block time.
    pub max_timeout_secs: u64,
    /// Gas charged for recording a nonce.
    pub gas_cost: u64,
}

impl UnorderedConfig {
    pub fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.max_timeout_secs)
    }
}

impl Default for UnorderedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_timeout_secs: 600,
            gas_cost: 2240,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub enabled_modes: Vec<SignMode>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            enabled_modes: vec![SignMode::Direct, SignMode::LegacyJson],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was read, parsed and validated
    /// * `Err` if the file couldn't be read, the TOML is invalid, or a value is out of range
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.chain_id.is_empty() {
            return Err(ConfigurationError::Invalid("chain_id must not be empty".into()));
        }
        if self.params.tx_sig_limit == 0 {
            return Err(ConfigurationError::Invalid("params.tx_sig_limit must be positive".into()));
        }
        if self.unordered.enabled && self.unordered.max_timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "unordered.max_timeout_secs must be positive when unordered mode is enabled".into(),
            ));
        }
        if self.signing.enabled_modes.is_empty() {
            return Err(ConfigurationError::Invalid("signing.enabled_modes must not be empty".into()));
        }
        self.fees.parsed_min_gas_prices()?;
        Ok(())
    }
}
