use chrono::{DateTime, Utc};
use std::fmt;

use crate::gas::GasMeter;
use crate::state::{CacheStore, KvStore, WriteSet};
use crate::types::Event;

/// Which verification context an admission runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecMode {
    /// First admission into the mempool.
    Check,
    /// Re-admission of a pooled transaction after a block commits.
    ReCheck,
    /// Dry run for gas estimation. Never commits.
    Simulate,
    /// Block execution against committed state.
    Finalize,
}

impl ExecMode {
    /// Mempool modes, where node-local fee policy applies.
    pub fn is_check(&self) -> bool {
        matches!(self, ExecMode::Check | ExecMode::ReCheck)
    }

    pub fn is_simulate(&self) -> bool {
        matches!(self, ExecMode::Simulate)
    }

    /// Whether a successful run's writes are applied to the caller's store.
    pub fn commits(&self) -> bool {
        !self.is_simulate()
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecMode::Check => "check",
            ExecMode::ReCheck => "recheck",
            ExecMode::Simulate => "simulate",
            ExecMode::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// The block a transaction is being admitted against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEnv {
    pub chain_id: String,
    pub height: u64,
    pub time: DateTime<Utc>,
    /// Consensus limit on gas per block, if any.
    pub max_block_gas: Option<u64>,
}

impl BlockEnv {
    pub fn new(chain_id: impl Into<String>, height: u64, time: DateTime<Utc>) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            time,
            max_block_gas: None,
        }
    }

    pub fn with_max_block_gas(mut self, max_block_gas: u64) -> Self {
        self.max_block_gas = Some(max_block_gas);
        self
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

/// Per-run execution context handed from stage to stage.
///
/// Owns the run's storage overlay: keepers read and write through `store`,
/// and nothing reaches the caller's base store unless the run succeeds.
pub struct Context<'a> {
    pub store: CacheStore<'a>,
    pub gas_meter: GasMeter,
    pub mode: ExecMode,
    pub env: BlockEnv,
    /// Encoded transaction length in bytes, as received by the host.
    pub tx_len: usize,
    pub priority: i64,
    events: Vec<Event>,
}

impl<'a> Context<'a> {
    /// Starts a run over `base`. The meter is unbounded until context setup
    /// installs the transaction's own.
    pub fn new(base: &'a dyn KvStore, env: BlockEnv, mode: ExecMode, tx_len: usize) -> Self {
        Self {
            store: CacheStore::new(base),
            gas_meter: GasMeter::infinite(),
            mode,
            env,
            tx_len,
            priority: 0,
            events: Vec::new(),
        }
    }

    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consumes the context, handing back its captured writes and events.
    pub fn finish(self) -> (WriteSet, Vec<Event>) {
        (self.store.into_write_set(), self.events)
    }
}
