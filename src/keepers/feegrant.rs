use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::FeegrantKeeper;
use crate::coins::Coins;
use crate::error::{AnteError, GrantError};
use crate::state::{KvStore, get_json, set_json};

const GRANT_PREFIX: &[u8] = b"grant/";

/// A basic allowance: optional total spend limit and optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAllowance {
    /// `None` means unlimited.
    pub spend_limit: Option<Coins>,
    pub expiration: Option<DateTime<Utc>>,
}

impl FeeAllowance {
    /// Applies `fee` to the allowance. Returns `true` when the allowance is
    /// used up and should be removed.
    fn accept(&mut self, fee: &Coins, now: DateTime<Utc>) -> Result<bool, GrantError> {
        if let Some(expiration) = self.expiration {
            if expiration <= now {
                return Err(GrantError::Expired);
            }
        }

        match &self.spend_limit {
            None => Ok(false),
            Some(limit) => {
                let left = limit.checked_sub(fee).ok_or(GrantError::LimitExceeded)?;
                let exhausted = left.is_zero();
                self.spend_limit = Some(left);
                Ok(exhausted)
            }
        }
    }
}

/// Allowances stored under `grant/<granter><grantee>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreFeegrantKeeper;

impl StoreFeegrantKeeper {
    pub fn new() -> Self {
        Self
    }

    pub fn grant_allowance(
        &self,
        store: &mut dyn KvStore,
        granter: &Address,
        grantee: &Address,
        allowance: &FeeAllowance,
    ) -> Result<(), AnteError> {
        Ok(set_json(store, Self::key(granter, grantee), allowance)?)
    }

    pub fn get_allowance(
        &self,
        store: &dyn KvStore,
        granter: &Address,
        grantee: &Address,
    ) -> Result<Option<FeeAllowance>, AnteError> {
        Ok(get_json(store, &Self::key(granter, grantee))?)
    }

    fn key(granter: &Address, grantee: &Address) -> Vec<u8> {
        let mut key = GRANT_PREFIX.to_vec();
        key.extend_from_slice(granter.as_bytes());
        key.extend_from_slice(grantee.as_bytes());
        key
    }
}

impl FeegrantKeeper for StoreFeegrantKeeper {
    fn use_granted_fees(
        &self,
        store: &mut dyn KvStore,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        now: DateTime<Utc>,
    ) -> Result<(), GrantError> {
        let key = Self::key(granter, grantee);
        let mut allowance: FeeAllowance = get_json(store, &key)?.ok_or(GrantError::NoGrant)?;

        if allowance.accept(fee, now)? {
            store.delete(&key);
        } else {
            set_json(store, key, &allowance)?;
        }
        Ok(())
    }
}
