use ethers::types::U256;
use std::sync::Arc;
use tracing::debug;

use crate::ante::{AnteStage, Context, StageKind};
use crate::coins::{Coins, GasPrice};
use crate::error::{AnteError, GrantError};
use crate::keepers::{AccountKeeper, BankKeeper, FeegrantKeeper};
use crate::types::{Event, Tx};

/// Decides the fee actually charged and the transaction's mempool priority.
pub type TxFeeChecker = Arc<dyn Fn(&Context<'_>, &Tx) -> Result<(Coins, i64), AnteError> + Send + Sync>;

/// Enforces the node's minimum gas prices during mempool checks and charges
/// the declared fee as is. Block execution never applies node-local prices.
pub fn default_fee_checker(min_gas_prices: Vec<GasPrice>) -> TxFeeChecker {
    Arc::new(move |ctx: &Context<'_>, tx: &Tx| {
        let fee = &tx.auth_info.fee.amount;
        let gas = tx.gas_limit();

        if ctx.mode.is_check() {
            let required = Coins::from_coins(
                min_gas_prices
                    .iter()
                    .filter(|price| !price.is_zero())
                    .map(|price| price.fee_for(gas)),
            );
            if !required.is_empty() && !fee.is_any_gte(&required) {
                return Err(AnteError::InsufficientFee {
                    got: fee.to_string(),
                    required: required.to_string(),
                });
            }
        }

        Ok((fee.clone(), tx_priority(fee, gas)))
    })
}

/// Lowest per-gas price across the fee's denominations, capped at `i64::MAX`.
pub fn tx_priority(fee: &Coins, gas: u64) -> i64 {
    let cap = U256::from(i64::MAX as u64);
    fee.iter()
        .map(|coin| {
            let price = if gas > 0 { coin.amount / U256::from(gas) } else { coin.amount };
            if price > cap { i64::MAX } else { price.as_u64() as i64 }
        })
        .min()
        .unwrap_or(0)
}

/// Charges the fee to its payer, or to the granter when one is named.
///
/// A grant is keyed on the fee's named granter only: it is used whenever the
/// granter differs from the payer, and never as a fallback for a payer that
/// cannot cover the fee itself.
///
/// Runs before any signature is verified, so the fee is priced against what
/// the transaction claims.
pub struct DeductFee {
    accounts: Arc<dyn AccountKeeper>,
    bank: Arc<dyn BankKeeper>,
    feegrant: Option<Arc<dyn FeegrantKeeper>>,
    fee_checker: TxFeeChecker,
}

impl DeductFee {
    pub fn new(
        accounts: Arc<dyn AccountKeeper>,
        bank: Arc<dyn BankKeeper>,
        feegrant: Option<Arc<dyn FeegrantKeeper>>,
        fee_checker: TxFeeChecker,
    ) -> Self {
        Self {
            accounts,
            bank,
            feegrant,
            fee_checker,
        }
    }

    fn deduct(&self, ctx: &mut Context<'_>, tx: &Tx, fee: &Coins) -> Result<(), AnteError> {
        let payer = tx
            .fee_payer()
            .ok_or_else(|| AnteError::InvalidRequest("transaction has no fee payer".into()))?;
        let mut deduct_from = payer;

        if let Some(granter) = tx.auth_info.fee.granter.filter(|g| *g != payer) {
            let feegrant = self
                .feegrant
                .as_ref()
                .ok_or_else(|| AnteError::InvalidRequest("fee grants are not enabled".into()))?;
            feegrant
                .use_granted_fees(&mut ctx.store, &granter, &payer, fee, ctx.env.time)
                .map_err(|reason| match reason {
                    GrantError::Store(e) => AnteError::Store(e),
                    reason => AnteError::FeeGrant {
                        granter,
                        grantee: payer,
                        reason,
                    },
                })?;
            debug!("Fee of {} for {:?} granted by {:?}", fee, payer, granter);
            deduct_from = granter;
        }

        if self.accounts.get_account(&ctx.store, &deduct_from)?.is_none() {
            return Err(AnteError::UnknownAddress(deduct_from));
        }
        if !fee.is_zero() {
            self.bank.deduct_fee(&mut ctx.store, &deduct_from, fee)?;
        }

        ctx.emit_event(
            Event::new("tx")
                .attr("fee", fee.to_string())
                .attr("fee_payer", format!("{deduct_from:?}")),
        );
        Ok(())
    }
}

impl AnteStage for DeductFee {
    fn kind(&self) -> StageKind {
        StageKind::DeductFee
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let (fee, priority) = if ctx.mode.is_simulate() {
            (tx.auth_info.fee.amount.clone(), 0)
        } else {
            (self.fee_checker)(&*ctx, tx)?
        };

        self.deduct(ctx, tx, &fee)?;
        ctx.priority = priority;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ante::{BlockEnv, ExecMode};
    use crate::error::ErrorKind;
    use crate::state::MemStore;
    use chrono::Utc;

    fn tx_with_fee(amount: Coins, gas: u64) -> Tx {
        let mut tx = Tx::default();
        tx.auth_info.fee.amount = amount;
        tx.auth_info.fee.gas_limit = gas;
        tx
    }

    #[test]
    fn test_priority_is_min_price_across_denoms() {
        let fee = Coins::from_coins([
            crate::coins::Coin::new("stake", 2_000u64),
            crate::coins::Coin::new("uatom", 500u64),
        ]);
        assert_eq!(tx_priority(&fee, 100), 5);
        assert_eq!(tx_priority(&Coins::empty(), 100), 0);
        assert_eq!(tx_priority(&Coins::single("stake", 42u64), 0), 42);
    }

    #[test]
    fn test_min_gas_prices_only_in_check_modes() {
        let base = MemStore::new();
        let checker = default_fee_checker(vec!["0.5stake".parse().unwrap()]);
        let tx = tx_with_fee(Coins::single("stake", 40u64), 100);
        let env = BlockEnv::new("c", 5, Utc::now());

        let check = Context::new(&base, env.clone(), ExecMode::Check, 0);
        let err = checker(&check, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
        assert_eq!(
            err,
            AnteError::InsufficientFee {
                got: "40stake".into(),
                required: "50stake".into()
            }
        );

        let finalize = Context::new(&base, env, ExecMode::Finalize, 0);
        let (fee, priority) = checker(&finalize, &tx).unwrap();
        assert_eq!(fee, Coins::single("stake", 40u64));
        assert_eq!(priority, 0);
    }

    #[test]
    fn test_any_denom_meeting_its_minimum_is_enough() {
        let base = MemStore::new();
        let checker = default_fee_checker(vec!["1stake".parse().unwrap(), "1uatom".parse().unwrap()]);
        let tx = tx_with_fee(Coins::single("uatom", 100u64), 100);
        let ctx = Context::new(&base, BlockEnv::new("c", 5, Utc::now()), ExecMode::ReCheck, 0);

        let (_, priority) = checker(&ctx, &tx).unwrap();
        assert_eq!(priority, 1);
    }
}
