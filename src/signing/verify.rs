use super::{SignModeHandler, SignerData};
use crate::error::SignatureError;
use crate::types::{PublicKey, SignatureData, Tx};

/// Verifies `data` against `key`, recursing through multisig members.
///
/// A multisig needs one bit per member key, at least `threshold` bits set and
/// exactly one signature per set bit. Every member signs the same sign bytes,
/// built from `signer` under the member's own sign mode.
pub fn verify_signature(
    handler: &dyn SignModeHandler,
    key: &PublicKey,
    data: &SignatureData,
    signer: &SignerData,
    tx: &Tx,
) -> Result<(), SignatureError> {
    match (key, data) {
        (PublicKey::Multisig { threshold, keys }, SignatureData::Multi { bitarray, signatures }) => {
            if bitarray.len() != keys.len() {
                return Err(SignatureError::Multisig(format!(
                    "bit array size {} does not match {} keys",
                    bitarray.len(),
                    keys.len()
                )));
            }
            let set = bitarray.iter().filter(|bit| **bit).count();
            if set < *threshold as usize {
                return Err(SignatureError::Multisig(format!(
                    "{set} signatures is below threshold {threshold}"
                )));
            }
            if signatures.len() != set {
                return Err(SignatureError::Multisig(format!(
                    "{} signatures for {set} set bits",
                    signatures.len()
                )));
            }

            let mut sigs = signatures.iter();
            for (member, present) in keys.iter().zip(bitarray) {
                if !*present {
                    continue;
                }
                let sig = sigs
                    .next()
                    .ok_or_else(|| SignatureError::Multisig("missing member signature".into()))?;
                verify_signature(handler, member, sig, signer, tx)?;
            }
            Ok(())
        }
        (PublicKey::Multisig { .. }, SignatureData::Single { .. })
        | (_, SignatureData::Multi { .. }) => Err(SignatureError::ShapeMismatch),
        (leaf, SignatureData::Single { mode, signature }) => {
            let sign_bytes = handler.sign_bytes(*mode, signer, tx)?;
            handler.verify(*mode, leaf, &sign_bytes, signature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::DefaultSignModeHandler;
    use crate::types::SignMode;
    use ed25519_dalek::Signer as _;
    use ethers::types::Address;

    fn signer_data() -> SignerData {
        SignerData {
            address: Address::repeat_byte(1),
            chain_id: "test-chain".into(),
            account_number: 0,
            sequence: 0,
            public_key: None,
        }
    }

    fn member(seed: u8) -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&[seed; 32])
    }

    fn sign(handler: &DefaultSignModeHandler, sk: &ed25519_dalek::SigningKey, tx: &Tx) -> SignatureData {
        let bytes = handler.sign_bytes(SignMode::Direct, &signer_data(), tx).unwrap();
        SignatureData::Single {
            mode: SignMode::Direct,
            signature: sk.sign(&bytes).to_bytes().to_vec(),
        }
    }

    #[test]
    fn test_multisig_threshold() {
        let handler = DefaultSignModeHandler::default();
        let tx = Tx::default();
        let (a, b, c) = (member(1), member(2), member(3));
        let key = PublicKey::Multisig {
            threshold: 2,
            keys: [&a, &b, &c]
                .iter()
                .map(|sk| PublicKey::Ed25519(sk.verifying_key().to_bytes()))
                .collect(),
        };

        let two_of_three = SignatureData::Multi {
            bitarray: vec![true, false, true],
            signatures: vec![sign(&handler, &a, &tx), sign(&handler, &c, &tx)],
        };
        assert_eq!(verify_signature(&handler, &key, &two_of_three, &signer_data(), &tx), Ok(()));

        let one_of_three = SignatureData::Multi {
            bitarray: vec![false, true, false],
            signatures: vec![sign(&handler, &b, &tx)],
        };
        assert!(matches!(
            verify_signature(&handler, &key, &one_of_three, &signer_data(), &tx),
            Err(SignatureError::Multisig(_))
        ));

        // Signatures placed against the wrong members.
        let swapped = SignatureData::Multi {
            bitarray: vec![true, true, false],
            signatures: vec![sign(&handler, &b, &tx), sign(&handler, &a, &tx)],
        };
        assert_eq!(
            verify_signature(&handler, &key, &swapped, &signer_data(), &tx),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_shape_mismatch_and_disabled_mode() {
        let tx = Tx::default();
        let sk = member(1);
        let key = PublicKey::Ed25519(sk.verifying_key().to_bytes());

        let multi = SignatureData::Multi { bitarray: vec![true], signatures: vec![] };
        let handler = DefaultSignModeHandler::default();
        assert_eq!(
            verify_signature(&handler, &key, &multi, &signer_data(), &tx),
            Err(SignatureError::ShapeMismatch)
        );

        let direct_only = DefaultSignModeHandler::new(vec![SignMode::Direct], &Default::default());
        let legacy = SignatureData::Single { mode: SignMode::LegacyJson, signature: vec![0; 64] };
        assert_eq!(
            verify_signature(&direct_only, &key, &legacy, &signer_data(), &tx),
            Err(SignatureError::ModeDisabled(SignMode::LegacyJson))
        );
    }
}
