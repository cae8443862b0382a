use ethers::types::Address;
use std::sync::Arc;
use tracing::debug;

use super::simulation_pubkey;
use crate::ante::{AnteStage, Context, ExecMode, StageKind};
use crate::config::Params;
use crate::error::AnteError;
use crate::gas::GasMeter;
use crate::keepers::AccountKeeper;
use crate::signing::{SignModeHandler, SignerData, verify_signature};
use crate::types::{AccountRecord, Event, KeyAlgorithm, PublicKey, SignatureData, Tx};

/// Charges the gas for verifying one signer's signature against its key.
pub type SigGasConsumer =
    Arc<dyn Fn(&mut GasMeter, &SignatureData, &PublicKey) -> Result<(), AnteError> + Send + Sync>;

/// Prices each leaf signature by its key algorithm, using the sign mode
/// handler's cost table. Multisig charges only for the members that signed.
pub fn default_sig_gas_consumer(handler: Arc<dyn SignModeHandler>) -> SigGasConsumer {
    Arc::new(move |meter: &mut GasMeter, sig: &SignatureData, key: &PublicKey| {
        consume_signature_gas(handler.as_ref(), meter, sig, key)
    })
}

fn consume_signature_gas(
    handler: &dyn SignModeHandler,
    meter: &mut GasMeter,
    sig: &SignatureData,
    key: &PublicKey,
) -> Result<(), AnteError> {
    match key {
        PublicKey::Multisig { keys, .. } => {
            let SignatureData::Multi { bitarray, signatures } = sig else {
                return Err(AnteError::InvalidPubKey("expected multisig signature data".into()));
            };
            let mut member_sigs = signatures.iter();
            for (member, present) in keys.iter().zip(bitarray) {
                if !*present {
                    continue;
                }
                let Some(member_sig) = member_sigs.next() else {
                    break;
                };
                consume_signature_gas(handler, meter, member_sig, member)?;
            }
            Ok(())
        }
        leaf => {
            let algorithm = leaf.algorithm();
            let cost = handler
                .cost(algorithm)
                .ok_or_else(|| AnteError::InvalidPubKey(format!("unrecognized public key type: {algorithm:?}")))?;
            let descriptor = match algorithm {
                KeyAlgorithm::Ed25519 => "ante verify: ed25519",
                _ => "ante verify: secp256k1",
            };
            meter.consume(cost, descriptor)
        }
    }
}

fn signer_account(
    accounts: &dyn AccountKeeper,
    ctx: &Context<'_>,
    signer: &Address,
) -> Result<AccountRecord, AnteError> {
    accounts
        .get_account(&ctx.store, signer)?
        .ok_or(AnteError::UnknownAddress(*signer))
}

fn leaf_signatures<'s>(sig: &'s SignatureData, out: &mut Vec<&'s [u8]>) {
    match sig {
        SignatureData::Single { signature, .. } => out.push(signature.as_slice()),
        SignatureData::Multi { signatures, .. } => {
            for inner in signatures {
                leaf_signatures(inner, out);
            }
        }
    }
}

/// Stores public keys carried by the transaction on signer accounts that do
/// not have one yet. Each key must derive to its signer's address.
pub struct SetPubKey {
    accounts: Arc<dyn AccountKeeper>,
}

impl SetPubKey {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteStage for SetPubKey {
    fn kind(&self) -> StageKind {
        StageKind::SetPubKey
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let signers = tx.signers();
        let infos = &tx.auth_info.signer_infos;
        if infos.len() != signers.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: signers.len(),
                got: infos.len(),
            });
        }
        let simulate = ctx.mode.is_simulate();

        for (i, (info, signer)) in infos.iter().zip(&signers).enumerate() {
            let key = match &info.public_key {
                Some(key) => key.clone(),
                None if simulate => simulation_pubkey(),
                None => continue,
            };
            if !simulate && key.address() != *signer {
                return Err(AnteError::InvalidPubKey(format!(
                    "pubKey does not match signer address {signer:?} with signer index: {i}"
                )));
            }

            let mut account = signer_account(self.accounts.as_ref(), ctx, signer)?;
            if account.public_key.is_some() {
                continue;
            }
            account.public_key = Some(key);
            self.accounts.set_account(&mut ctx.store, &account)?;
        }

        for (info, signer) in infos.iter().zip(&signers) {
            ctx.emit_event(Event::new("tx").attr("acc_seq", format!("{signer:?}/{}", info.sequence)));
        }
        let mut leaves = Vec::new();
        for sig in &tx.signatures {
            leaf_signatures(sig, &mut leaves);
        }
        for bytes in leaves.into_iter().filter(|b| !b.is_empty()) {
            ctx.emit_event(Event::new("tx").attr("signature", hex::encode(bytes)));
        }
        Ok(())
    }
}

/// Bounds the total number of signatures, counting each multisig member.
pub struct ValidateSigCount {
    params: Params,
    accounts: Arc<dyn AccountKeeper>,
}

impl ValidateSigCount {
    pub fn new(params: Params, accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { params, accounts }
    }
}

impl AnteStage for ValidateSigCount {
    fn kind(&self) -> StageKind {
        StageKind::ValidateSigCount
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let limit = self.params.tx_sig_limit;
        let mut count: u64 = 0;

        for (info, signer) in tx.auth_info.signer_infos.iter().zip(tx.signers()) {
            let key = match &info.public_key {
                Some(key) => Some(key.clone()),
                None => self
                    .accounts
                    .get_account(&ctx.store, &signer)?
                    .and_then(|acc| acc.public_key),
            };
            count = count.saturating_add(key.map_or(1, |k| k.count_sub_keys()));
            if count > limit {
                return Err(AnteError::TooManySignatures { got: count, limit });
            }
        }
        Ok(())
    }
}

/// Charges verification gas for every signature before any is verified.
pub struct SigGasConsume {
    accounts: Arc<dyn AccountKeeper>,
    consumer: SigGasConsumer,
}

impl SigGasConsume {
    pub fn new(accounts: Arc<dyn AccountKeeper>, consumer: SigGasConsumer) -> Self {
        Self { accounts, consumer }
    }
}

impl AnteStage for SigGasConsume {
    fn kind(&self) -> StageKind {
        StageKind::SigGasConsume
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let sigs = tx.signatures_v2()?;
        let signers = tx.signers();

        for (sig, signer) in sigs.iter().zip(&signers) {
            let account = signer_account(self.accounts.as_ref(), ctx, signer)?;
            let key = match account.public_key {
                Some(key) => key,
                None if ctx.mode.is_simulate() => simulation_pubkey(),
                None => return Err(AnteError::InvalidPubKey("pubkey on account is not set".into())),
            };
            (self.consumer)(&mut ctx.gas_meter, &sig.data, &key)?;
        }
        Ok(())
    }
}

/// Checks each signer's sequence and signature, in signer order.
///
/// Simulation and recheck skip the cryptographic check but still require the
/// claimed sequences to match.
pub struct SigVerification {
    accounts: Arc<dyn AccountKeeper>,
    handler: Arc<dyn SignModeHandler>,
}

impl SigVerification {
    pub fn new(accounts: Arc<dyn AccountKeeper>, handler: Arc<dyn SignModeHandler>) -> Self {
        Self { accounts, handler }
    }
}

impl AnteStage for SigVerification {
    fn kind(&self) -> StageKind {
        StageKind::SigVerification
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        let sigs = tx.signatures_v2()?;
        let signers = tx.signers();
        if sigs.len() != signers.len() {
            return Err(AnteError::SignerCountMismatch {
                expected: signers.len(),
                got: sigs.len(),
            });
        }
        if let Some(payer) = tx.fee_payer() {
            if !signers.contains(&payer) {
                return Err(AnteError::Unauthorized(format!("fee payer {payer:?} is not a signer")));
            }
        }

        let skip_crypto = ctx.mode.is_simulate() || ctx.mode == ExecMode::ReCheck;

        for (sig, signer) in sigs.iter().zip(&signers) {
            let account = signer_account(self.accounts.as_ref(), ctx, signer)?;

            if !tx.body.unordered && sig.sequence != account.sequence {
                return Err(AnteError::WrongSequence {
                    address: *signer,
                    expected: account.sequence,
                    got: sig.sequence,
                });
            }
            if skip_crypto {
                continue;
            }

            let key = account
                .public_key
                .clone()
                .ok_or_else(|| AnteError::InvalidPubKey("pubkey on account is not set".into()))?;
            let account_number = if ctx.env.is_genesis() { 0 } else { account.account_number };
            let data = SignerData {
                address: *signer,
                chain_id: ctx.env.chain_id.clone(),
                account_number,
                sequence: sig.sequence,
                public_key: Some(key.clone()),
            };

            if let Err(e) = verify_signature(self.handler.as_ref(), &key, &sig.data, &data, tx) {
                debug!("Signature from {:?} rejected: {}", signer, e);
                return Err(AnteError::Unauthorized(format!(
                    "signature verification failed; please verify account number ({}), sequence ({}) and chain-id ({})",
                    account_number, sig.sequence, ctx.env.chain_id
                )));
            }
        }
        Ok(())
    }
}

/// Asserts each signer's claimed sequence and bumps it by one.
/// Unordered transactions are left to the nonce stage.
pub struct IncrementSequence {
    accounts: Arc<dyn AccountKeeper>,
}

impl IncrementSequence {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteStage for IncrementSequence {
    fn kind(&self) -> StageKind {
        StageKind::IncrementSequence
    }

    fn handle(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), AnteError> {
        if tx.body.unordered {
            return Ok(());
        }

        let signers = tx.signers();
        let infos = &tx.auth_info.signer_infos;
        for (i, signer) in signers.iter().enumerate() {
            let claimed = infos
                .get(i)
                .map(|info| info.sequence)
                .ok_or(AnteError::SignerCountMismatch {
                    expected: signers.len(),
                    got: infos.len(),
                })?;

            let mut account = signer_account(self.accounts.as_ref(), ctx, signer)?;
            if claimed != account.sequence {
                return Err(AnteError::WrongSequence {
                    address: *signer,
                    expected: account.sequence,
                    got: claimed,
                });
            }
            account.sequence = account
                .sequence
                .checked_add(1)
                .ok_or_else(|| AnteError::InvalidRequest(format!("sequence overflow for {signer:?}")))?;
            self.accounts.set_account(&mut ctx.store, &account)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::DefaultSignModeHandler;
    use crate::types::SignMode;

    fn single() -> SignatureData {
        SignatureData::Single {
            mode: SignMode::Direct,
            signature: vec![1; 64],
        }
    }

    #[test]
    fn test_multisig_gas_counts_present_members() {
        let consumer = default_sig_gas_consumer(Arc::new(DefaultSignModeHandler::default()));
        let key = PublicKey::Multisig {
            threshold: 2,
            keys: vec![
                PublicKey::Secp256k1(vec![2; 33]),
                PublicKey::Ed25519([1; 32]),
                PublicKey::Secp256k1(vec![3; 33]),
            ],
        };
        let sig = SignatureData::Multi {
            bitarray: vec![false, true, true],
            signatures: vec![single(), single()],
        };

        let mut meter = GasMeter::new(10_000);
        consumer(&mut meter, &sig, &key).unwrap();
        assert_eq!(meter.consumed(), 590 + 1000);
    }

    #[test]
    fn test_multisig_key_needs_multisig_data() {
        let consumer = default_sig_gas_consumer(Arc::new(DefaultSignModeHandler::default()));
        let key = PublicKey::Multisig {
            threshold: 1,
            keys: vec![PublicKey::Ed25519([1; 32])],
        };
        let mut meter = GasMeter::new(10_000);
        assert!(matches!(
            consumer(&mut meter, &single(), &key),
            Err(AnteError::InvalidPubKey(_))
        ));
    }
}
