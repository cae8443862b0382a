//! Ante Module
//!
//! The transaction admission pipeline. A fixed, ordered chain of stages runs
//! over a per-transaction [`Context`]; any stage may reject, in which case the
//! whole run is rolled back and the rejection reason is reported with the gas
//! consumed so far.
//!
//! - [`build_pipeline`]: assembles the chain from [`HandlerOptions`]
//! - [`AnteHandler`]: runs a transaction through the chain and commits on success
//! - [`stages`]: the individual admission checks

mod builder;
mod chain;
mod context;
pub mod stages;


pub use builder::{AnteHandler, Evaluation, HandlerOptions, build_pipeline};
pub use chain::{Chain, Rejected};
pub use context::{BlockEnv, Context, ExecMode};
pub use stages::{
    ExtensionOptionChecker, SigGasConsumer, TxFeeChecker, default_fee_checker, default_sig_gas_consumer,
    reject_all_extensions,
};

use std::fmt;

use crate::error::AnteError;
use crate::types::Tx;

/// One admission check.
///
/// Stages are built once and shared by every run, so per-transaction state
/// lives only in the [`Context`]. Mode-specific behaviour is decided inside
/// `handle`, never by reordering the chain.
pub trait AnteStage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError>;
}

/// Tags each stage in the chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    SetUpContext,
    ExtensionOptions,
    ValidateBasic,
    TxTimeout,
    ValidateMemo,
    ConsumeTxSizeGas,
    DeductFee,
    SetPubKey,
    ValidateSigCount,
    SigGasConsume,
    SigVerification,
    IncrementSequence,
    UnorderedTx,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::SetUpContext => "set_up_context",
            StageKind::ExtensionOptions => "extension_options",
            StageKind::ValidateBasic => "validate_basic",
            StageKind::TxTimeout => "tx_timeout",
            StageKind::ValidateMemo => "validate_memo",
            StageKind::ConsumeTxSizeGas => "consume_tx_size_gas",
            StageKind::DeductFee => "deduct_fee",
            StageKind::SetPubKey => "set_pub_key",
            StageKind::ValidateSigCount => "validate_sig_count",
            StageKind::SigGasConsume => "sig_gas_consume",
            StageKind::SigVerification => "sig_verification",
            StageKind::IncrementSequence => "increment_sequence",
            StageKind::UnorderedTx => "unordered_tx",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
