//! Signing Module
//!
//! The signature-scheme registry the pipeline verifies against:
//! - [`SignModeHandler`]: builds sign bytes per mode, verifies leaf keys, prices verification
//! - [`DefaultSignModeHandler`]: secp256k1 and ed25519 with `Direct` and `LegacyJson` modes
//! - [`verify_signature`]: walks multisig keys down to leaf verifications

mod keys;
mod sign_bytes;
mod verify;

pub use keys::{verify_ed25519, verify_secp256k1};
pub use sign_bytes::{direct_sign_bytes, legacy_json_sign_bytes};
pub use verify::verify_signature;

use ethers::types::Address;

use crate::config::{Config, Params};
use crate::error::SignatureError;
use crate::gas::Gas;
use crate::types::{KeyAlgorithm, PublicKey, SignMode, Tx};

/// What a signer commits to besides the transaction itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    pub address: Address,
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub public_key: Option<PublicKey>,
}

pub trait SignModeHandler: Send + Sync {
    /// The bytes a signer using `mode` signs.
    fn sign_bytes(&self, mode: SignMode, data: &SignerData, tx: &Tx) -> Result<Vec<u8>, SignatureError>;

    /// Verifies a leaf (non-multisig) signature.
    fn verify(&self, mode: SignMode, key: &PublicKey, sign_bytes: &[u8], signature: &[u8]) -> Result<(), SignatureError>;

    /// Gas charged to verify one signature of `algorithm`, `None` if unsupported.
    fn cost(&self, algorithm: KeyAlgorithm) -> Option<Gas>;
}

#[derive(Debug, Clone)]
pub struct DefaultSignModeHandler {
    enabled_modes: Vec<SignMode>,
    secp256k1_cost: Gas,
    ed25519_cost: Gas,
}

impl DefaultSignModeHandler {
    pub fn new(enabled_modes: Vec<SignMode>, params: &Params) -> Self {
        Self {
            enabled_modes,
            secp256k1_cost: params.sig_verify_cost_secp256k1,
            ed25519_cost: params.sig_verify_cost_ed25519,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.signing.enabled_modes.clone(), &config.params)
    }

    fn ensure_enabled(&self, mode: SignMode) -> Result<(), SignatureError> {
        if self.enabled_modes.contains(&mode) {
            Ok(())
        } else {
            Err(SignatureError::ModeDisabled(mode))
        }
    }
}

impl Default for DefaultSignModeHandler {
    fn default() -> Self {
        Self::new(vec![SignMode::Direct, SignMode::LegacyJson], &Params::default())
    }
}

impl SignModeHandler for DefaultSignModeHandler {
    fn sign_bytes(&self, mode: SignMode, data: &SignerData, tx: &Tx) -> Result<Vec<u8>, SignatureError> {
        self.ensure_enabled(mode)?;
        match mode {
            SignMode::Direct => direct_sign_bytes(data, tx),
            SignMode::LegacyJson => legacy_json_sign_bytes(data, tx),
        }
    }

    fn verify(&self, mode: SignMode, key: &PublicKey, sign_bytes: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        self.ensure_enabled(mode)?;
        match key {
            PublicKey::Secp256k1(bytes) => verify_secp256k1(bytes, sign_bytes, signature),
            PublicKey::Ed25519(bytes) => verify_ed25519(bytes, sign_bytes, signature),
            PublicKey::Multisig { .. } => Err(SignatureError::ShapeMismatch),
        }
    }

    fn cost(&self, algorithm: KeyAlgorithm) -> Option<Gas> {
        match algorithm {
            KeyAlgorithm::Secp256k1 => Some(self.secp256k1_cost),
            KeyAlgorithm::Ed25519 => Some(self.ed25519_cost),
            // Priced per member by the caller.
            KeyAlgorithm::Multisig => None,
        }
    }
}
