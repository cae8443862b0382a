//! This crate implements a transaction admission pipeline for account-based chains.
//! Every transaction passes a fixed chain of checks (gas, fees, keys, signatures,
//! replay protection) against an isolated view of state before it is accepted.

pub mod types; // Transactions, keys, signatures, events and admission results.
pub mod coins; // Multi-denomination amounts and gas prices.
pub mod error; // Rejection reasons and their taxonomy.
pub mod config; // Loads pipeline parameters and node policy from TOML.
pub mod gas; // Metering of validation work.
pub mod state; // Key-value stores, copy-on-write overlays and shared base state.
pub mod keepers; // Account, balance, fee grant and unordered nonce collaborators.
pub mod signing; // Sign bytes, key verification and signature costs.
pub mod ante; // The admission stages, the chain runner and the pipeline builder.

#[cfg(test)]
mod testutil;

// Re-export commonly used types and configurations for easier access.
pub use ante::{AnteHandler, BlockEnv, ExecMode, HandlerOptions, build_pipeline};
pub use config::Config;
pub use error::{AnteError, ConfigurationError, ErrorKind};
pub use types::*;
