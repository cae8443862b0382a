use chrono::Duration;
use std::sync::Arc;

use crate::ante::{AnteStage, Context, StageKind};
use crate::error::AnteError;
use crate::gas::Gas;
use crate::keepers::UnorderedNonceManager;
use crate::types::Tx;

/// Replay protection for transactions that opt out of sequences.
///
/// The timeout timestamp is the nonce. It must lie within the configured
/// window ahead of the block time, and each signer may use it once until it
/// expires.
pub struct UnorderedTx {
    manager: Arc<dyn UnorderedNonceManager>,
    max_timeout: Duration,
    gas_cost: Gas,
}

impl UnorderedTx {
    pub fn new(manager: Arc<dyn UnorderedNonceManager>, max_timeout: Duration, gas_cost: Gas) -> Self {
        Self {
            manager,
            max_timeout,
            gas_cost,
        }
    }
}

impl AnteStage for UnorderedTx {
    fn kind(&self) -> StageKind {
        StageKind::UnorderedTx
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        if !tx.body.unordered {
            return Ok(());
        }

        let timeout = tx.body.timeout_timestamp.ok_or_else(|| {
            AnteError::InvalidRequest("unordered transaction must have timeout_timestamp set".into())
        })?;
        let now = ctx.env.time;
        if timeout < now {
            return Err(AnteError::TimeoutTimestamp {
                block_time: now.to_rfc3339(),
                timeout: timeout.to_rfc3339(),
            });
        }
        if now.checked_add_signed(self.max_timeout).is_some_and(|limit| timeout > limit) {
            return Err(AnteError::InvalidRequest(format!(
                "unordered tx ttl exceeds {}s",
                self.max_timeout.num_seconds()
            )));
        }

        ctx.gas_meter.consume(self.gas_cost, "unordered tx")?;

        for signer in tx.signers() {
            self.manager.try_add_nonce(&mut ctx.store, &signer, timeout, now)?;
        }
        Ok(())
    }
}
