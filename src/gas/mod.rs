//! Gas Metering Module
//!
//! Tracks the abstract gas budget a transaction declared and fails hard once
//! validation work would exceed it.

mod meter;

pub use meter::{Gas, GasMeter};
