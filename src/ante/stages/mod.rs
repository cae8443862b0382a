//! The standard admission stages, in the order the builder chains them.

mod basic;
mod extension;
mod fee;
mod setup;
mod sigs;
mod unordered;

pub use basic::{ConsumeTxSizeGas, TxTimeout, ValidateBasic, ValidateMemo};
pub use extension::{ExtensionOptionChecker, ExtensionOptions, reject_all_extensions};
pub use fee::{DeductFee, TxFeeChecker, default_fee_checker, tx_priority};
pub use setup::SetUpContext;
pub use sigs::{
    IncrementSequence, SetPubKey, SigGasConsume, SigGasConsumer, SigVerification, ValidateSigCount,
    default_sig_gas_consumer,
};
pub use unordered::UnorderedTx;

use crate::types::PublicKey;

/// Compressed secp256k1 key standing in for signers without one during simulation.
const SIM_SECP256K1_PUBKEY: [u8; 33] = [
    0x03, 0x5a, 0xd6, 0x81, 0x0a, 0x47, 0xf0, 0x73, 0x55, 0x3f, 0xf3, 0x0d, 0x2f, 0xcc, 0x7e, 0x0d, 0x3b, 0x1c, 0x0b,
    0x74, 0xb6, 0x1a, 0x1a, 0xaa, 0x25, 0x82, 0x34, 0x40, 0x37, 0x15, 0x1e, 0x14, 0x3a,
];

pub(crate) fn simulation_pubkey() -> PublicKey {
    PublicKey::Secp256k1(SIM_SECP256K1_PUBKEY.to_vec())
}
