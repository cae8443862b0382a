//! Error Types Module
//!
//! Every rejection the admission pipeline can produce, grouped into the coarse
//! [`ErrorKind`] taxonomy hosts use to decide how to report or charge.

use ethers::types::Address;
use thiserror::Error;

use crate::types::SignMode;

/// Coarse classification of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transaction is malformed independent of any state.
    Structural,
    /// The gas meter was exhausted mid-run.
    OutOfGas,
    /// The declared fee is below the node's minimum gas prices.
    InsufficientFee,
    /// The fee payer cannot cover the fee.
    InsufficientFunds,
    /// A fee grant was requested but is absent, expired or exhausted.
    NoGrant,
    /// Bad public key, bad signature, wrong sequence or replayed nonce.
    Authentication,
    /// The transaction expired by height or timestamp.
    Timeout,
    /// A stored record could not be read back.
    Internal,
}

/// Why a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnteError {
    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {used}")]
    OutOfGas {
        descriptor: String,
        limit: u64,
        used: u64,
    },

    #[error("invalid gas limit: {0}")]
    InvalidGasLimit(String),

    #[error("no messages in transaction")]
    NoMessages,

    #[error("no signatures supplied")]
    NoSignatures,

    #[error("wrong number of signers; expected {expected}, got {got}")]
    SignerCountMismatch { expected: usize, got: usize },

    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown extension options")]
    UnknownExtensionOptions,

    #[error("maximum number of characters is {max} but received {got} characters")]
    MemoTooLarge { max: u64, got: u64 },

    #[error("block height: {height}, timeout height: {timeout}")]
    TimeoutHeight { height: u64, timeout: u64 },

    #[error("block time: {block_time}, timeout timestamp: {timeout}")]
    TimeoutTimestamp { block_time: String, timeout: String },

    #[error("insufficient fees; got: {got} required: {required}")]
    InsufficientFee { got: String, required: String },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("{granter:?} does not allow to pay fees for {grantee:?}: {reason}")]
    FeeGrant {
        granter: Address,
        grantee: Address,
        reason: GrantError,
    },

    #[error("account {0:?} does not exist")]
    UnknownAddress(Address),

    #[error("invalid pubkey: {0}")]
    InvalidPubKey(String),

    #[error("signatures: {got}, limit: {limit}")]
    TooManySignatures { got: u64, limit: u64 },

    #[error("account sequence mismatch for {address:?}, expected {expected}, got {got}")]
    WrongSequence {
        address: Address,
        expected: u64,
        got: u64,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unordered nonce {nonce} already used by {address:?}")]
    UnorderedNonceUsed { address: Address, nonce: i64 },

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl AnteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnteError::OutOfGas { .. } => ErrorKind::OutOfGas,
            AnteError::InvalidGasLimit(_)
            | AnteError::NoMessages
            | AnteError::NoSignatures
            | AnteError::SignerCountMismatch { .. }
            | AnteError::InvalidCoins(_)
            | AnteError::InvalidRequest(_)
            | AnteError::UnknownExtensionOptions
            | AnteError::MemoTooLarge { .. }
            | AnteError::TooManySignatures { .. } => ErrorKind::Structural,
            AnteError::TimeoutHeight { .. } | AnteError::TimeoutTimestamp { .. } => ErrorKind::Timeout,
            AnteError::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            AnteError::InsufficientFunds(_) | AnteError::UnknownAddress(_) => ErrorKind::InsufficientFunds,
            AnteError::FeeGrant { .. } => ErrorKind::NoGrant,
            AnteError::InvalidPubKey(_)
            | AnteError::WrongSequence { .. }
            | AnteError::Unauthorized(_)
            | AnteError::UnorderedNonceUsed { .. } => ErrorKind::Authentication,
            AnteError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Stable numeric code for hosts that report rejections over RPC.
    pub fn code(&self) -> u32 {
        match self {
            AnteError::Store(_) => 1,
            AnteError::Unauthorized(_)
            | AnteError::SignerCountMismatch { .. }
            | AnteError::UnorderedNonceUsed { .. } => 4,
            AnteError::InsufficientFunds(_) => 5,
            AnteError::InvalidPubKey(_) => 8,
            AnteError::UnknownAddress(_) => 9,
            AnteError::InvalidCoins(_) => 10,
            AnteError::OutOfGas { .. } => 11,
            AnteError::MemoTooLarge { .. } => 12,
            AnteError::InsufficientFee { .. } => 13,
            AnteError::TooManySignatures { .. } => 14,
            AnteError::NoSignatures => 15,
            AnteError::InvalidRequest(_) | AnteError::NoMessages | AnteError::FeeGrant { .. } => 18,
            AnteError::TimeoutHeight { .. } => 30,
            AnteError::UnknownExtensionOptions => 31,
            AnteError::WrongSequence { .. } => 32,
            AnteError::InvalidGasLimit(_) => 41,
            AnteError::TimeoutTimestamp { .. } => 42,
        }
    }
}

/// Reasons a fee grant cannot cover a fee.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    #[error("fee-grant not found")]
    NoGrant,
    #[error("fee allowance expired")]
    Expired,
    #[error("fee limit exceeded")]
    LimitExceeded,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a signature or key was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("sign mode {0:?} is not enabled")]
    ModeDisabled(SignMode),
    #[error("malformed public key: {0}")]
    MalformedKey(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("signature does not verify")]
    Invalid,
    #[error("multisig: {0}")]
    Multisig(String),
    #[error("signature data does not match key type")]
    ShapeMismatch,
    #[error("cannot encode sign bytes: {0}")]
    Encoding(String),
}

/// Failures reading typed records out of the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// The pipeline cannot be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("account keeper is required for ante builder")]
    MissingAccountKeeper,
    #[error("bank keeper is required for ante builder")]
    MissingBankKeeper,
    #[error("sign mode handler is required for ante builder")]
    MissingSignModeHandler,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
