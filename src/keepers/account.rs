use ethers::types::Address;

use super::AccountKeeper;
use crate::error::AnteError;
use crate::state::{KvStore, get_json, set_json};
use crate::types::AccountRecord;

const ACCOUNT_PREFIX: &[u8] = b"acc/";
const ACCOUNT_NUMBER_KEY: &[u8] = b"acc_number";

/// Account records stored as JSON under `acc/<address>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreAccountKeeper;

impl StoreAccountKeeper {
    pub fn new() -> Self {
        Self
    }

    /// Creates and stores a fresh account with the next account number.
    pub fn new_account(&self, store: &mut dyn KvStore, address: Address) -> Result<AccountRecord, AnteError> {
        let account = AccountRecord {
            address,
            account_number: self.next_account_number(store)?,
            sequence: 0,
            public_key: None,
        };
        self.set_account(store, &account)?;
        Ok(account)
    }

    fn key(address: &Address) -> Vec<u8> {
        let mut key = ACCOUNT_PREFIX.to_vec();
        key.extend_from_slice(address.as_bytes());
        key
    }
}

impl AccountKeeper for StoreAccountKeeper {
    fn get_account(&self, store: &dyn KvStore, address: &Address) -> Result<Option<AccountRecord>, AnteError> {
        Ok(get_json(store, &Self::key(address))?)
    }

    fn set_account(&self, store: &mut dyn KvStore, account: &AccountRecord) -> Result<(), AnteError> {
        Ok(set_json(store, Self::key(&account.address), account)?)
    }

    fn next_account_number(&self, store: &mut dyn KvStore) -> Result<u64, AnteError> {
        let next: u64 = get_json(store, ACCOUNT_NUMBER_KEY)?.unwrap_or(0);
        set_json(store, ACCOUNT_NUMBER_KEY.to_vec(), &(next + 1))?;
        Ok(next)
    }
}
