use ethers::utils::keccak256;
use serde_json::{Value, json};

use super::SignerData;
use crate::error::SignatureError;
use crate::types::{ExtensionOption, Tx};

/// Binary sign bytes:
/// `len(chain_id) || chain_id || account_number || sequence || keccak(body) || keccak(auth_info)`
/// with integers big-endian.
pub fn direct_sign_bytes(data: &SignerData, tx: &Tx) -> Result<Vec<u8>, SignatureError> {
    let body = serde_json::to_vec(&tx.body).map_err(|e| SignatureError::Encoding(e.to_string()))?;
    let auth_info = serde_json::to_vec(&tx.auth_info).map_err(|e| SignatureError::Encoding(e.to_string()))?;

    let chain_id = data.chain_id.as_bytes();
    let mut out = Vec::with_capacity(4 + chain_id.len() + 16 + 64);
    out.extend_from_slice(&(chain_id.len() as u32).to_be_bytes());
    out.extend_from_slice(chain_id);
    out.extend_from_slice(&data.account_number.to_be_bytes());
    out.extend_from_slice(&data.sequence.to_be_bytes());
    out.extend_from_slice(&keccak256(body));
    out.extend_from_slice(&keccak256(auth_info));
    Ok(out)
}

/// Human-readable JSON sign document with keys in lexicographic order and
/// integers rendered as strings. Covers every body field, so replay mode,
/// timeouts and extension options cannot be changed after signing.
pub fn legacy_json_sign_bytes(data: &SignerData, tx: &Tx) -> Result<Vec<u8>, SignatureError> {
    let fee = &tx.auth_info.fee;
    let msgs: Vec<_> = tx
        .body
        .messages
        .iter()
        .map(|msg| {
            json!({
                "type": msg.type_url,
                "value": hex::encode(&msg.value),
            })
        })
        .collect();

    let doc = json!({
        "account_number": data.account_number.to_string(),
        "chain_id": data.chain_id,
        "extension_options": options_json(&tx.body.extension_options),
        "fee": {
            "amount": fee.amount.to_string(),
            "gas": fee.gas_limit.to_string(),
            "granter": fee.granter.map(|a| format!("{a:?}")).unwrap_or_default(),
            "payer": fee.payer.map(|a| format!("{a:?}")).unwrap_or_default(),
        },
        "memo": tx.body.memo,
        "msgs": msgs,
        "non_critical_extension_options": options_json(&tx.body.non_critical_extension_options),
        "sequence": data.sequence.to_string(),
        "timeout_height": tx.body.timeout_height.to_string(),
        "timeout_timestamp": tx.body.timeout_timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
        "unordered": tx.body.unordered,
    });

    serde_json::to_vec(&doc).map_err(|e| SignatureError::Encoding(e.to_string()))
}

fn options_json(options: &[ExtensionOption]) -> Vec<Value> {
    options
        .iter()
        .map(|opt| json!({ "type": opt.type_url, "value": hex::encode(&opt.value) }))
        .collect()
}
