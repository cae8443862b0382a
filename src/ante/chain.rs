use tracing::{debug, warn};

use super::{AnteStage, Context, StageKind};
use crate::error::AnteError;
use crate::gas::Gas;
use crate::types::Tx;

/// Why a run stopped, and how much gas it had burned by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub stage: StageKind,
    pub error: AnteError,
    pub gas_used: Gas,
}

/// An ordered list of stages, fixed at build time and replayed per transaction.
pub struct Chain {
    stages: Vec<Box<dyn AnteStage>>,
}

impl Chain {
    pub fn new(stages: Vec<Box<dyn AnteStage>>) -> Self {
        Self { stages }
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order over `ctx`.
    ///
    /// The first failure stops the run and drops the context, discarding every
    /// write made so far. Gas consumed up to and including the failing charge
    /// is reported, not refunded.
    pub fn run<'a>(&self, mut ctx: Context<'a>, tx: &Tx) -> Result<Context<'a>, Rejected> {
        for stage in &self.stages {
            if let Err(error) = stage.handle(&mut ctx, tx) {
                let gas_used = ctx.gas_meter.consumed();
                warn!(
                    "Transaction rejected at {} ({} mode): {} [gas used {}]",
                    stage.kind(),
                    ctx.mode,
                    error,
                    gas_used
                );
                return Err(Rejected {
                    stage: stage.kind(),
                    error,
                    gas_used,
                });
            }
            debug!(stage = %stage.kind(), gas = ctx.gas_meter.consumed(), "stage passed");
        }
        Ok(ctx)
    }
}
