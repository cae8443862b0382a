//! Shared fixtures for pipeline tests: deterministic keys, funded accounts and
//! signed transactions.

use chrono::{DateTime, TimeZone, Utc};
use ed25519_dalek::Signer as _;
use ethers::types::{Address, U256};
use k256::ecdsa::signature::Signer;

use crate::ante::{AnteHandler, BlockEnv};
use crate::coins::Coins;
use crate::config::Config;
use crate::keepers::{AccountKeeper, BankKeeper, StoreAccountKeeper, StoreBankKeeper};
use crate::signing::{SignerData, direct_sign_bytes, legacy_json_sign_bytes};
use crate::state::MemStore;
use crate::types::{AccountRecord, Message, PublicKey, SignMode, SignatureData, SignerInfo, Tx};

pub const CHAIN_ID: &str = "admission-test";
pub const DENOM: &str = "stake";
/// Encoded length hosts report for fixture transactions.
pub const TX_LEN: usize = 300;

pub fn block_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn env(height: u64) -> BlockEnv {
    BlockEnv::new(CHAIN_ID, height, block_time())
}

pub fn test_config() -> Config {
    Config {
        chain_id: CHAIN_ID.to_string(),
        ..Config::default()
    }
}

pub fn test_handler() -> AnteHandler {
    AnteHandler::from_config(&test_config()).unwrap()
}

enum TestKey {
    Secp256k1(k256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

pub struct TestSigner {
    key: TestKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl TestSigner {
    pub fn secp256k1(seed: u8) -> Self {
        let sk = k256::ecdsa::SigningKey::from_slice(&[seed; 32]).unwrap();
        let public_key = PublicKey::Secp256k1(sk.verifying_key().to_encoded_point(true).as_bytes().to_vec());
        Self {
            address: public_key.address(),
            public_key,
            key: TestKey::Secp256k1(sk),
        }
    }

    pub fn ed25519(seed: u8) -> Self {
        let sk = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
        let public_key = PublicKey::Ed25519(sk.verifying_key().to_bytes());
        Self {
            address: public_key.address(),
            public_key,
            key: TestKey::Ed25519(sk),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match &self.key {
            TestKey::Secp256k1(sk) => {
                let sig: k256::ecdsa::Signature = sk.sign(message);
                sig.to_bytes().to_vec()
            }
            TestKey::Ed25519(sk) => sk.sign(message).to_bytes().to_vec(),
        }
    }
}

/// Creates an account for `address` and mints `amount` of [`DENOM`] to it.
pub fn fund_address(store: &mut MemStore, address: Address, amount: u64) -> AccountRecord {
    let account = StoreAccountKeeper::new().new_account(store, address).unwrap();
    StoreBankKeeper::default()
        .mint(store, &address, &Coins::single(DENOM, amount))
        .unwrap();
    account
}

pub fn fund(store: &mut MemStore, signer: &TestSigner, amount: u64) -> AccountRecord {
    fund_address(store, signer.address, amount)
}

pub fn account(store: &MemStore, address: &Address) -> AccountRecord {
    StoreAccountKeeper::new().get_account(store, address).unwrap().unwrap()
}

pub fn balance(store: &MemStore, address: &Address) -> U256 {
    StoreBankKeeper::default().balance(store, address, DENOM).unwrap()
}

/// One message requiring every listed signer, each claiming sequence 0.
pub fn build_tx(signers: &[(Address, PublicKey)], fee: u64, gas_limit: u64) -> Tx {
    let mut tx = Tx::default();
    tx.body.messages = vec![Message {
        type_url: "/bank.MsgSend".into(),
        value: b"send".to_vec(),
        signers: signers.iter().map(|(addr, _)| *addr).collect(),
    }];
    tx.auth_info.signer_infos = signers
        .iter()
        .map(|(_, key)| SignerInfo {
            public_key: Some(key.clone()),
            sequence: 0,
        })
        .collect();
    tx.auth_info.fee.amount = Coins::single(DENOM, fee);
    tx.auth_info.fee.gas_limit = gas_limit;
    tx
}

pub fn transfer_tx(signers: &[&TestSigner], fee: u64, gas_limit: u64) -> Tx {
    let entries: Vec<(Address, PublicKey)> = signers
        .iter()
        .map(|s| (s.address, s.public_key.clone()))
        .collect();
    build_tx(&entries, fee, gas_limit)
}

/// Sign bytes for `address` using the sequence its signer info claims.
pub fn sign_bytes(tx: &Tx, index: usize, address: Address, account_number: u64, mode: SignMode) -> Vec<u8> {
    let info = &tx.auth_info.signer_infos[index];
    let data = SignerData {
        address,
        chain_id: CHAIN_ID.to_string(),
        account_number,
        sequence: info.sequence,
        public_key: info.public_key.clone(),
    };
    match mode {
        SignMode::Direct => direct_sign_bytes(&data, tx).unwrap(),
        SignMode::LegacyJson => legacy_json_sign_bytes(&data, tx).unwrap(),
    }
}

/// Replaces the signatures with fresh ones, one per `(signer, account_number)`.
pub fn sign_tx(tx: &mut Tx, signers: &[(&TestSigner, u64)], mode: SignMode) {
    let signatures = signers
        .iter()
        .enumerate()
        .map(|(i, (signer, account_number))| SignatureData::Single {
            mode,
            signature: signer.sign(&sign_bytes(tx, i, signer.address, *account_number, mode)),
        })
        .collect();
    tx.signatures = signatures;
}
