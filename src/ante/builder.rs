use std::sync::Arc;
use tracing::{debug, info};

use super::stages::{
    ConsumeTxSizeGas, DeductFee, ExtensionOptionChecker, ExtensionOptions, IncrementSequence, SetPubKey,
    SetUpContext, SigGasConsume, SigGasConsumer, SigVerification, TxFeeChecker, TxTimeout, UnorderedTx,
    ValidateBasic, ValidateMemo, ValidateSigCount, default_fee_checker, default_sig_gas_consumer,
    reject_all_extensions,
};
use super::{AnteStage, BlockEnv, Chain, Context, ExecMode, StageKind};
use crate::coins::GasPrice;
use crate::config::{Config, Params, UnorderedConfig};
use crate::error::ConfigurationError;
use crate::keepers::{
    AccountKeeper, BankKeeper, FeegrantKeeper, StoreAccountKeeper, StoreBankKeeper, StoreFeegrantKeeper,
    StoreUnorderedNonceManager, UnorderedNonceManager,
};
use crate::signing::{DefaultSignModeHandler, SignModeHandler};
use crate::state::{KvStore, SharedStore, WriteSet};
use crate::types::{AdmissionResult, Tx};

/// Collaborators and parameters the pipeline is assembled from.
///
/// Account keeper, bank keeper and sign mode handler are required; everything
/// else falls back to a default policy or disables its feature when absent.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    pub account_keeper: Option<Arc<dyn AccountKeeper>>,
    pub bank_keeper: Option<Arc<dyn BankKeeper>>,
    /// Without one, transactions naming a fee granter are rejected.
    pub feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
    pub sign_mode_handler: Option<Arc<dyn SignModeHandler>>,
    pub sig_gas_consumer: Option<SigGasConsumer>,
    pub tx_fee_checker: Option<TxFeeChecker>,
    pub extension_checker: Option<ExtensionOptionChecker>,
    /// Enables unordered transactions and appends the nonce stage.
    pub unordered_nonce_manager: Option<Arc<dyn UnorderedNonceManager>>,
    pub params: Params,
    pub unordered: UnorderedConfig,
    /// Used by the default fee checker.
    pub min_gas_prices: Vec<GasPrice>,
}

impl HandlerOptions {
    /// Wires the store-backed keepers and the default sign mode handler.
    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let unordered_nonce_manager: Option<Arc<dyn UnorderedNonceManager>> = if config.unordered.enabled {
            Some(Arc::new(StoreUnorderedNonceManager::new()))
        } else {
            None
        };

        Ok(Self {
            account_keeper: Some(Arc::new(StoreAccountKeeper::new())),
            bank_keeper: Some(Arc::new(StoreBankKeeper::default())),
            feegrant_keeper: Some(Arc::new(StoreFeegrantKeeper::new())),
            sign_mode_handler: Some(Arc::new(DefaultSignModeHandler::from_config(config))),
            sig_gas_consumer: None,
            tx_fee_checker: None,
            extension_checker: None,
            unordered_nonce_manager,
            params: config.params.clone(),
            unordered: config.unordered.clone(),
            min_gas_prices: config.fees.parsed_min_gas_prices()?,
        })
    }
}

/// Assembles the stage chain. The order is fixed here for every transaction.
pub fn build_pipeline(options: HandlerOptions) -> Result<AnteHandler, ConfigurationError> {
    let accounts = options
        .account_keeper
        .ok_or(ConfigurationError::MissingAccountKeeper)?;
    let bank = options.bank_keeper.ok_or(ConfigurationError::MissingBankKeeper)?;
    let handler = options
        .sign_mode_handler
        .ok_or(ConfigurationError::MissingSignModeHandler)?;

    if options.params.tx_sig_limit == 0 {
        return Err(ConfigurationError::Invalid("tx_sig_limit must be positive".into()));
    }

    let params = options.params;
    let fee_checker = options
        .tx_fee_checker
        .unwrap_or_else(|| default_fee_checker(options.min_gas_prices));
    let extension_checker = options.extension_checker.unwrap_or_else(reject_all_extensions);
    let sig_gas_consumer = options
        .sig_gas_consumer
        .unwrap_or_else(|| default_sig_gas_consumer(handler.clone()));
    let unordered_enabled = options.unordered_nonce_manager.is_some();

    let mut stages: Vec<Box<dyn AnteStage>> = vec![
        Box::new(SetUpContext),
        Box::new(ExtensionOptions::new(extension_checker)),
        Box::new(ValidateBasic::new(unordered_enabled)),
        Box::new(TxTimeout),
        Box::new(ValidateMemo::new(params.clone())),
        Box::new(ConsumeTxSizeGas::new(params.clone(), accounts.clone())),
        Box::new(DeductFee::new(
            accounts.clone(),
            bank,
            options.feegrant_keeper,
            fee_checker,
        )),
        Box::new(SetPubKey::new(accounts.clone())),
        Box::new(ValidateSigCount::new(params, accounts.clone())),
        Box::new(SigGasConsume::new(accounts.clone(), sig_gas_consumer)),
        Box::new(SigVerification::new(accounts.clone(), handler)),
        Box::new(IncrementSequence::new(accounts)),
    ];

    if let Some(manager) = options.unordered_nonce_manager {
        let max_timeout = chrono::Duration::from_std(options.unordered.max_timeout())
            .map_err(|e| ConfigurationError::Invalid(format!("unordered.max_timeout_secs: {e}")))?;
        stages.push(Box::new(UnorderedTx::new(manager, max_timeout, options.unordered.gas_cost)));
    }

    info!("Ante pipeline assembled with {} stages (unordered: {})", stages.len(), unordered_enabled);
    Ok(AnteHandler {
        chain: Chain::new(stages),
    })
}

/// Outcome of a run together with the writes to commit, if any.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: AdmissionResult,
    /// Present only for successful runs in modes that commit.
    pub writes: Option<WriteSet>,
}

/// The assembled pipeline. Immutable and shareable across callers.
pub struct AnteHandler {
    chain: Chain,
}

impl AnteHandler {
    pub fn from_config(config: &Config) -> Result<Self, ConfigurationError> {
        build_pipeline(HandlerOptions::from_config(config)?)
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.chain.kinds()
    }

    /// Runs `tx` against `base` without touching it.
    ///
    /// `tx_len` is the encoded transaction's length in bytes.
    pub fn evaluate(&self, base: &dyn KvStore, env: &BlockEnv, mode: ExecMode, tx: &Tx, tx_len: usize) -> Evaluation {
        debug!("Admitting transaction in {} mode at height {}", mode, env.height);
        let gas_wanted = tx.gas_limit();
        let ctx = Context::new(base, env.clone(), mode, tx_len);

        match self.chain.run(ctx, tx) {
            Ok(ctx) => {
                let gas_used = ctx.gas_meter.consumed();
                let priority = ctx.priority;
                let (writes, events) = ctx.finish();
                debug!("Transaction admitted: gas used {}, priority {}", gas_used, priority);
                Evaluation {
                    result: AdmissionResult {
                        success: true,
                        gas_wanted,
                        gas_used,
                        priority,
                        events,
                        error: None,
                    },
                    writes: mode.commits().then_some(writes),
                }
            }
            Err(rejected) => Evaluation {
                result: AdmissionResult {
                    success: false,
                    gas_wanted,
                    gas_used: rejected.gas_used,
                    priority: 0,
                    events: Vec::new(),
                    error: Some(rejected.error),
                },
                writes: None,
            },
        }
    }

    /// Runs `tx` and, on success outside simulation, applies its writes to `store`.
    pub fn admit(&self, store: &mut dyn KvStore, env: &BlockEnv, mode: ExecMode, tx: &Tx, tx_len: usize) -> AdmissionResult {
        let Evaluation { result, writes } = self.evaluate(&*store, env, mode, tx, tx_len);
        if let Some(writes) = writes {
            writes.apply(store);
        }
        result
    }

    /// Like [`AnteHandler::admit`] against a store shared between callers.
    ///
    /// Committing modes hold the exclusive lock across the whole run, so two
    /// runs spending the same sequence or nonce can never both commit.
    pub fn admit_shared(
        &self,
        store: &SharedStore,
        env: &BlockEnv,
        mode: ExecMode,
        tx: &Tx,
        tx_len: usize,
    ) -> AdmissionResult {
        if mode.commits() {
            let mut guard = store.write();
            self.admit(&mut *guard, env, mode, tx, tx_len)
        } else {
            let guard = store.read();
            self.evaluate(&*guard, env, mode, tx, tx_len).result
        }
    }
}
