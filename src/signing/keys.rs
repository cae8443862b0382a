use ed25519_dalek::Verifier as _;
use k256::ecdsa::signature::Verifier;

use crate::error::SignatureError;

/// Verifies a 64-byte `r || s` ECDSA signature over SHA-256 of `message`.
/// High-S signatures are rejected by the verifier.
pub fn verify_secp256k1(key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key)
        .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
    let sig = k256::ecdsa::Signature::from_slice(signature)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::Invalid)
}

pub fn verify_ed25519(key: &[u8; 32], message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(key)
        .map_err(|e| SignatureError::MalformedKey(e.to_string()))?;
    let sig = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::Invalid)
}
