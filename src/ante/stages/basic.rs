use std::sync::Arc;

use super::simulation_pubkey;
use crate::ante::{AnteStage, Context, ExecMode, StageKind};
use crate::config::Params;
use crate::error::AnteError;
use crate::keepers::AccountKeeper;
use crate::types::{PublicKey, Tx};

/// Length of the placeholder signature priced in simulation.
const SIM_SIGNATURE_LEN: usize = 64;
/// Per-signature encoding overhead priced in simulation.
const SIM_SIGNATURE_OVERHEAD: usize = 6;

/// State-independent checks on the transaction itself.
///
/// Skipped on recheck: the transaction already passed them when first checked.
pub struct ValidateBasic {
    unordered_enabled: bool,
}

impl ValidateBasic {
    pub fn new(unordered_enabled: bool) -> Self {
        Self { unordered_enabled }
    }
}

impl AnteStage for ValidateBasic {
    fn kind(&self) -> StageKind {
        StageKind::ValidateBasic
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        if ctx.mode == ExecMode::ReCheck {
            return Ok(());
        }

        if tx.body.messages.is_empty() {
            return Err(AnteError::NoMessages);
        }
        if tx.signatures.is_empty() {
            return Err(AnteError::NoSignatures);
        }

        let signers = tx.signers();
        if signers.is_empty() {
            return Err(AnteError::InvalidRequest("transaction has no signers".into()));
        }
        if tx.signatures.len() != signers.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: signers.len(),
                got: tx.signatures.len(),
            });
        }
        if tx.auth_info.signer_infos.len() != signers.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: signers.len(),
                got: tx.auth_info.signer_infos.len(),
            });
        }

        tx.auth_info.fee.amount.validate()?;
        let max_gas = i64::MAX as u64;
        if tx.gas_limit() > max_gas {
            return Err(AnteError::InvalidGasLimit(format!(
                "invalid gas supplied; {} > {}",
                tx.gas_limit(),
                max_gas
            )));
        }

        if tx.body.unordered {
            if !self.unordered_enabled {
                return Err(AnteError::InvalidRequest("unordered transactions are not supported".into()));
            }
            if tx.body.timeout_timestamp.is_none() {
                return Err(AnteError::InvalidRequest(
                    "unordered transaction must have timeout_timestamp set".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects transactions whose timeout height or timestamp has passed.
///
/// Enforced when finalizing and also on recheck, so pooled transactions are
/// evicted once the chain moves past their timeout. A first check may target a
/// future height and is never rejected here.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxTimeout;

impl AnteStage for TxTimeout {
    fn kind(&self) -> StageKind {
        StageKind::TxTimeout
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        if !matches!(ctx.mode, ExecMode::Finalize | ExecMode::ReCheck) {
            return Ok(());
        }

        let timeout = tx.body.timeout_height;
        if timeout > 0 && ctx.env.height > timeout {
            return Err(AnteError::TimeoutHeight {
                height: ctx.env.height,
                timeout,
            });
        }

        if let Some(deadline) = tx.body.timeout_timestamp {
            if ctx.env.time > deadline {
                return Err(AnteError::TimeoutTimestamp {
                    block_time: ctx.env.time.to_rfc3339(),
                    timeout: deadline.to_rfc3339(),
                });
            }
        }
        Ok(())
    }
}

/// Charges per signer for the memo, then bounds its length.
pub struct ValidateMemo {
    params: Params,
}

impl ValidateMemo {
    pub fn new(params: Params) -> Self {
        Self { params }
    }
}

impl AnteStage for ValidateMemo {
    fn kind(&self) -> StageKind {
        StageKind::ValidateMemo
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let signers = tx.signers().len() as u64;
        ctx.gas_meter
            .consume(self.params.memo_gas_per_signer.saturating_mul(signers), "memo")?;

        let got = tx.body.memo.len() as u64;
        if got > self.params.max_memo_characters {
            return Err(AnteError::MemoTooLarge {
                max: self.params.max_memo_characters,
                got,
            });
        }
        Ok(())
    }
}

/// Charges gas for every encoded byte of the transaction.
///
/// In simulation, signers whose signature is still empty are also charged for
/// the signature and key they will eventually attach, so estimates are not low.
pub struct ConsumeTxSizeGas {
    params: Params,
    accounts: Arc<dyn AccountKeeper>,
}

impl ConsumeTxSizeGas {
    pub fn new(params: Params, accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { params, accounts }
    }
}

impl AnteStage for ConsumeTxSizeGas {
    fn kind(&self) -> StageKind {
        StageKind::ConsumeTxSizeGas
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let per_byte = self.params.tx_size_cost_per_byte;
        ctx.gas_meter
            .consume(per_byte.saturating_mul(ctx.tx_len as u64), "txSize")?;

        if !ctx.mode.is_simulate() {
            return Ok(());
        }

        for (i, signer) in tx.signers().iter().enumerate() {
            if tx.signatures.get(i).is_some_and(|sig| !sig.is_incomplete()) {
                continue;
            }

            let key = self
                .accounts
                .get_account(&ctx.store, signer)?
                .and_then(|acc| acc.public_key)
                .unwrap_or_else(simulation_pubkey);

            let mut cost = (SIM_SIGNATURE_LEN + key.to_bytes().len() + SIM_SIGNATURE_OVERHEAD) as u64;
            if matches!(key, PublicKey::Multisig { .. }) {
                cost = cost.saturating_mul(self.params.tx_sig_limit);
            }
            ctx.gas_meter.consume(per_byte.saturating_mul(cost), "txSize")?;
        }
        Ok(())
    }
}
