use chrono::{DateTime, Utc};
use ethers::types::Address;
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::coins::Coins;
use crate::error::AnteError;

/// How the bytes a signer commits to are constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    /// Binary layout over hashed body and auth info.
    Direct,
    /// Canonical (sorted-key) JSON sign document.
    LegacyJson,
}

/// Cryptographic algorithm behind a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Secp256k1,
    Ed25519,
    Multisig,
}

/// A signer's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicKey {
    /// 33-byte compressed SEC1 point.
    Secp256k1(Vec<u8>),
    Ed25519([u8; 32]),
    /// Threshold multisig over nested keys.
    Multisig { threshold: u32, keys: Vec<PublicKey> },
}

impl PublicKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::Multisig { .. } => KeyAlgorithm::Multisig,
        }
    }

    /// Raw key material prefixed with an algorithm tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Secp256k1(bytes) => {
                let mut out = vec![0x01];
                out.extend_from_slice(bytes);
                out
            }
            PublicKey::Ed25519(bytes) => {
                let mut out = vec![0x02];
                out.extend_from_slice(bytes);
                out
            }
            PublicKey::Multisig { threshold, keys } => {
                let mut out = vec![0x03];
                out.extend_from_slice(&threshold.to_be_bytes());
                for key in keys {
                    let inner = key.to_bytes();
                    out.extend_from_slice(&(inner.len() as u32).to_be_bytes());
                    out.extend_from_slice(&inner);
                }
                out
            }
        }
    }

    /// The account address this key controls.
    pub fn address(&self) -> Address {
        let hash = keccak256(self.to_bytes());
        Address::from_slice(&hash[12..])
    }

    /// Number of leaf keys; a multisig counts each of its members.
    pub fn count_sub_keys(&self) -> u64 {
        match self {
            PublicKey::Multisig { keys, .. } => keys.iter().map(PublicKey::count_sub_keys).sum(),
            _ => 1,
        }
    }
}

/// Signature material attached to a transaction for one signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureData {
    Single {
        mode: SignMode,
        signature: Vec<u8>,
    },
    /// One entry in `signatures` per set bit of `bitarray`, in order.
    Multi {
        bitarray: Vec<bool>,
        signatures: Vec<SignatureData>,
    },
}

impl SignatureData {
    /// True when no signature bytes were supplied (the simulate-mode shape).
    pub fn is_incomplete(&self) -> bool {
        match self {
            SignatureData::Single { signature, .. } => signature.is_empty(),
            SignatureData::Multi { signatures, .. } => {
                signatures.is_empty() || signatures.iter().any(SignatureData::is_incomplete)
            }
        }
    }
}

/// An opaque payload message handed to the execution engine after admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub type_url: String,
    pub value: Vec<u8>,
    /// Addresses whose authorization the message requires.
    pub signers: Vec<Address>,
}

/// A protocol extension field carried by a transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOption {
    pub type_url: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<Message>,
    pub memo: String,
    /// Zero means no height timeout.
    pub timeout_height: u64,
    /// Opts into nonce-window replay protection instead of sequences.
    pub unordered: bool,
    pub timeout_timestamp: Option<DateTime<Utc>>,
    pub extension_options: Vec<ExtensionOption>,
    pub non_critical_extension_options: Vec<ExtensionOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    /// May be omitted once the key is stored on the account.
    pub public_key: Option<PublicKey>,
    pub sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Coins,
    pub gas_limit: u64,
    pub payer: Option<Address>,
    pub granter: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

/// A decoded transaction. The pipeline only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    /// One entry per signer, aligned with `auth_info.signer_infos`.
    pub signatures: Vec<SignatureData>,
}

/// A signature joined with the key and sequence its signer claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureV2 {
    pub public_key: Option<PublicKey>,
    pub data: SignatureData,
    pub sequence: u64,
}

impl Tx {
    /// Required signers: message signers in first-seen order, then the
    /// explicit fee payer if it is not already among them.
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for msg in &self.body.messages {
            for signer in &msg.signers {
                if !signers.contains(signer) {
                    signers.push(*signer);
                }
            }
        }
        if let Some(payer) = self.auth_info.fee.payer {
            if !signers.contains(&payer) {
                signers.push(payer);
            }
        }
        signers
    }

    /// Explicit payer, otherwise the first signer.
    pub fn fee_payer(&self) -> Option<Address> {
        self.auth_info
            .fee
            .payer
            .or_else(|| self.signers().first().copied())
    }

    pub fn gas_limit(&self) -> u64 {
        self.auth_info.fee.gas_limit
    }

    pub fn public_keys(&self) -> Vec<Option<PublicKey>> {
        self.auth_info
            .signer_infos
            .iter()
            .map(|info| info.public_key.clone())
            .collect()
    }

    pub fn signatures_v2(&self) -> Result<Vec<SignatureV2>, AnteError> {
        if self.signatures.len() != self.auth_info.signer_infos.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: self.auth_info.signer_infos.len(),
                got: self.signatures.len(),
            });
        }
        Ok(self
            .auth_info
            .signer_infos
            .iter()
            .zip(&self.signatures)
            .map(|(info, data)| SignatureV2 {
                public_key: info.public_key.clone(),
                data: data.clone(),
                sequence: info.sequence,
            })
            .collect())
    }
}

/// Per-address persistent state owned by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: Address,
    pub account_number: u64,
    pub sequence: u64,
    pub public_key: Option<PublicKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// A typed record of something the pipeline did, surfaced to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Outcome of one admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionResult {
    pub success: bool,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub priority: i64,
    /// Only populated on success; a rejected run leaves no events behind.
    pub events: Vec<Event>,
    pub error: Option<AnteError>,
}

impl AdmissionResult {
    pub fn into_result(self) -> Result<AdmissionResult, AnteError> {
        match self.error.clone() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(signers: Vec<Address>) -> Message {
        Message {
            type_url: "/bank.MsgSend".into(),
            value: vec![],
            signers,
        }
    }

    #[test]
    fn test_signers_dedup_and_payer() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let c = Address::repeat_byte(0xcc);

        let mut tx = Tx::default();
        tx.body.messages = vec![msg(vec![a, b]), msg(vec![b, a])];
        assert_eq!(tx.signers(), vec![a, b]);
        assert_eq!(tx.fee_payer(), Some(a));

        tx.auth_info.fee.payer = Some(c);
        assert_eq!(tx.signers(), vec![a, b, c]);
        assert_eq!(tx.fee_payer(), Some(c));

        tx.auth_info.fee.payer = Some(b);
        assert_eq!(tx.signers(), vec![a, b]);
    }

    #[test]
    fn test_multisig_counts_leaves_and_has_distinct_address() {
        let k1 = PublicKey::Ed25519([1; 32]);
        let k2 = PublicKey::Secp256k1(vec![2; 33]);
        let multi = PublicKey::Multisig {
            threshold: 2,
            keys: vec![k1.clone(), k2.clone(), PublicKey::Multisig { threshold: 1, keys: vec![k1.clone()] }],
        };
        assert_eq!(multi.count_sub_keys(), 3);
        assert_ne!(multi.address(), k1.address());
        assert_ne!(k1.address(), k2.address());
    }

    #[test]
    fn test_signatures_v2_requires_alignment() {
        let mut tx = Tx::default();
        tx.auth_info.signer_infos = vec![SignerInfo { public_key: None, sequence: 3 }];
        assert!(tx.signatures_v2().is_err());

        tx.signatures = vec![SignatureData::Single { mode: SignMode::Direct, signature: vec![1] }];
        let sigs = tx.signatures_v2().unwrap();
        assert_eq!(sigs[0].sequence, 3);
        assert!(!sigs[0].data.is_incomplete());
    }
}
