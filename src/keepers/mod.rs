//! Keepers Module
//!
//! Narrow capability interfaces the admission pipeline needs from the rest of
//! the node, and store-backed implementations of each. Every method takes the
//! store it should act on explicitly: during admission that is the run's
//! overlay, so whatever a keeper writes is rolled back with the run.
//!
//! - [`AccountKeeper`]: account records, sequences, account numbers
//! - [`BankKeeper`]: balance checks and fee debits
//! - [`FeegrantKeeper`]: fee allowances one account grants another
//! - [`UnorderedNonceManager`]: the bounded set of consumed unordered nonces

mod account;
mod bank;
mod feegrant;
mod unordered;

pub use account::StoreAccountKeeper;
pub use bank::{StoreBankKeeper, fee_collector_address};
pub use feegrant::{FeeAllowance, StoreFeegrantKeeper};
pub use unordered::StoreUnorderedNonceManager;

use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};

use crate::coins::Coins;
use crate::error::{AnteError, GrantError};
use crate::state::KvStore;
use crate::types::AccountRecord;

pub trait AccountKeeper: Send + Sync {
    fn get_account(&self, store: &dyn KvStore, address: &Address) -> Result<Option<AccountRecord>, AnteError>;

    fn set_account(&self, store: &mut dyn KvStore, account: &AccountRecord) -> Result<(), AnteError>;

    /// Allocates the next unused account number.
    fn next_account_number(&self, store: &mut dyn KvStore) -> Result<u64, AnteError>;

    fn get_sequence(&self, store: &dyn KvStore, address: &Address) -> Result<u64, AnteError> {
        self.get_account(store, address)?
            .map(|acc| acc.sequence)
            .ok_or(AnteError::UnknownAddress(*address))
    }

    fn set_sequence(&self, store: &mut dyn KvStore, address: &Address, sequence: u64) -> Result<(), AnteError> {
        let mut account = self
            .get_account(store, address)?
            .ok_or(AnteError::UnknownAddress(*address))?;
        account.sequence = sequence;
        self.set_account(store, &account)
    }
}

pub trait BankKeeper: Send + Sync {
    fn balance(&self, store: &dyn KvStore, address: &Address, denom: &str) -> Result<U256, AnteError>;

    fn has_balance(&self, store: &dyn KvStore, address: &Address, amount: &Coins) -> Result<bool, AnteError> {
        for coin in amount.iter() {
            if self.balance(store, address, &coin.denom)? < coin.amount {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Moves `amount` from `from` to the fee collector.
    fn deduct_fee(&self, store: &mut dyn KvStore, from: &Address, amount: &Coins) -> Result<(), AnteError>;
}

pub trait FeegrantKeeper: Send + Sync {
    /// Charges `fee` against the allowance `granter` gave `grantee`.
    fn use_granted_fees(
        &self,
        store: &mut dyn KvStore,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        now: DateTime<Utc>,
    ) -> Result<(), GrantError>;
}

pub trait UnorderedNonceManager: Send + Sync {
    /// True if `sender` already consumed the nonce `timeout` and it has not expired.
    fn contains(
        &self,
        store: &dyn KvStore,
        sender: &Address,
        timeout: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, AnteError>;

    /// Records the nonce, failing if it is already live.
    fn try_add_nonce(
        &self,
        store: &mut dyn KvStore,
        sender: &Address,
        timeout: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AnteError>;

    /// Purges every record whose expiry is before `now`. Returns how many were removed.
    fn remove_expired(&self, store: &mut dyn KvStore, now: DateTime<Utc>) -> Result<usize, AnteError>;
}
