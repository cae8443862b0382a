use ethers::types::{Address, U256};
use ethers::utils::keccak256;

use super::BankKeeper;
use crate::coins::{Coin, Coins};
use crate::error::AnteError;
use crate::state::{KvStore, get_json, set_json};

const BALANCE_PREFIX: &[u8] = b"bal/";

/// Module account that collects deducted fees.
pub fn fee_collector_address() -> Address {
    Address::from_slice(&keccak256(b"module/fee_collector")[12..])
}

/// Balances stored per `(address, denom)` under `bal/<address>/<denom>`.
#[derive(Debug, Clone)]
pub struct StoreBankKeeper {
    fee_collector: Address,
}

impl Default for StoreBankKeeper {
    fn default() -> Self {
        Self {
            fee_collector: fee_collector_address(),
        }
    }
}

impl StoreBankKeeper {
    pub fn new(fee_collector: Address) -> Self {
        Self { fee_collector }
    }

    pub fn fee_collector(&self) -> Address {
        self.fee_collector
    }

    pub fn set_balance(&self, store: &mut dyn KvStore, address: &Address, coin: &Coin) -> Result<(), AnteError> {
        let key = Self::key(address, &coin.denom);
        if coin.amount.is_zero() {
            store.delete(&key);
            return Ok(());
        }
        Ok(set_json(store, key, &coin.amount)?)
    }

    /// Credits `amount` to `address`, creating balances as needed.
    pub fn mint(&self, store: &mut dyn KvStore, address: &Address, amount: &Coins) -> Result<(), AnteError> {
        for coin in amount.iter() {
            let current = self.balance(store, address, &coin.denom)?;
            let updated = current
                .checked_add(coin.amount)
                .ok_or_else(|| AnteError::InvalidCoins(format!("balance overflow for {}", coin.denom)))?;
            self.set_balance(store, address, &Coin::new(coin.denom.clone(), updated))?;
        }
        Ok(())
    }

    /// Every non-zero balance `address` holds.
    pub fn balances(&self, store: &dyn KvStore, address: &Address) -> Result<Coins, AnteError> {
        let prefix = Self::prefix(address);
        let mut coins = Vec::new();
        for (key, _) in store.prefix_entries(&prefix) {
            let denom = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            let amount = self.balance(store, address, &denom)?;
            coins.push(Coin::new(denom, amount));
        }
        Ok(Coins::from_coins(coins))
    }

    fn prefix(address: &Address) -> Vec<u8> {
        let mut key = BALANCE_PREFIX.to_vec();
        key.extend_from_slice(address.as_bytes());
        key.push(b'/');
        key
    }

    fn key(address: &Address, denom: &str) -> Vec<u8> {
        let mut key = Self::prefix(address);
        key.extend_from_slice(denom.as_bytes());
        key
    }
}

impl BankKeeper for StoreBankKeeper {
    fn balance(&self, store: &dyn KvStore, address: &Address, denom: &str) -> Result<U256, AnteError> {
        Ok(get_json(store, &Self::key(address, denom))?.unwrap_or_default())
    }

    fn deduct_fee(&self, store: &mut dyn KvStore, from: &Address, amount: &Coins) -> Result<(), AnteError> {
        let spendable = self.balances(store, from)?;
        let remaining = spendable.checked_sub(amount).ok_or_else(|| {
            AnteError::InsufficientFunds(format!("spendable balance {} is smaller than {}", spendable, amount))
        })?;

        for coin in amount.iter() {
            let left = remaining.amount_of(&coin.denom);
            self.set_balance(store, from, &Coin::new(coin.denom.clone(), left))?;
        }
        self.mint(store, &self.fee_collector, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemStore;

    #[test]
    fn test_deduct_fee_moves_to_collector() {
        let mut store = MemStore::new();
        let bank = StoreBankKeeper::default();
        let payer = Address::repeat_byte(7);

        bank.mint(&mut store, &payer, &Coins::single("stake", 1_000u64)).unwrap();
        bank.deduct_fee(&mut store, &payer, &Coins::single("stake", 250u64)).unwrap();

        assert_eq!(bank.balance(&store, &payer, "stake").unwrap(), U256::from(750));
        assert_eq!(
            bank.balance(&store, &bank.fee_collector(), "stake").unwrap(),
            U256::from(250)
        );
    }

    #[test]
    fn test_deduct_fee_rejects_overdraft_and_unknown_denom() {
        let mut store = MemStore::new();
        let bank = StoreBankKeeper::default();
        let payer = Address::repeat_byte(7);
        bank.mint(&mut store, &payer, &Coins::single("stake", 10u64)).unwrap();

        let err = bank
            .deduct_fee(&mut store, &payer, &Coins::single("stake", 11u64))
            .unwrap_err();
        assert!(matches!(err, AnteError::InsufficientFunds(_)));

        assert!(bank.deduct_fee(&mut store, &payer, &Coins::single("uatom", 1u64)).is_err());
        assert!(!bank.has_balance(&store, &payer, &Coins::single("uatom", 1u64)).unwrap());
        assert!(bank.has_balance(&store, &payer, &Coins::single("stake", 10u64)).unwrap());
    }
}
