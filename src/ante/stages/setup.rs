use crate::ante::{AnteStage, Context, StageKind};
use crate::error::AnteError;
use crate::gas::GasMeter;
use crate::types::Tx;

/// Installs the transaction's gas meter. Always the first stage.
///
/// Simulation and genesis run unmetered; everything else is limited to the
/// declared gas limit, which must be positive and may not exceed the block's
/// own gas cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetUpContext;

impl AnteStage for SetUpContext {
    fn kind(&self) -> StageKind {
        StageKind::SetUpContext
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let gas_limit = tx.gas_limit();

        if let Some(max) = ctx.env.max_block_gas {
            if gas_limit > max {
                return Err(AnteError::InvalidGasLimit(format!(
                    "tx gas limit {gas_limit} exceeds block max gas {max}"
                )));
            }
        }

        ctx.gas_meter = if ctx.mode.is_simulate() || ctx.env.is_genesis() {
            GasMeter::infinite()
        } else {
            if gas_limit == 0 {
                return Err(AnteError::InvalidGasLimit("must provide positive gas".into()));
            }
            GasMeter::new(gas_limit)
        };
        Ok(())
    }
}
