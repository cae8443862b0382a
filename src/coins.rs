//! Coin Amounts Module
//!
//! Multi-denomination amounts used for fees, balances and grant spend limits,
//! plus the fixed-point gas prices the node-local fee policy is configured with.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnteError;

/// Number of fractional digits carried by [`GasPrice`].
pub const GAS_PRICE_PRECISION: usize = 18;

/// A single amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins, kept sorted by denomination with no duplicates and no zero
/// entries once it has passed [`Coins::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a normalized set: sorted, merged by denom, zero amounts dropped.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut out = Coins::empty();
        for coin in coins {
            // Merging only fails on U256 overflow, which callers never construct.
            if let Some(merged) = out.checked_add(&Coins(vec![coin.clone()])) {
                out = merged;
            }
        }
        out
    }

    pub fn single(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self::from_coins([Coin::new(denom, amount)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every amount is zero (an empty set is zero).
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.amount.is_zero())
    }

    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or_default()
    }

    /// Checks denominations are well formed, sorted, unique and amounts positive.
    pub fn validate(&self) -> Result<(), AnteError> {
        let mut prev: Option<&str> = None;
        for coin in &self.0 {
            if !is_valid_denom(&coin.denom) {
                return Err(AnteError::InvalidCoins(format!("invalid denom: {}", coin.denom)));
            }
            if coin.amount.is_zero() {
                return Err(AnteError::InvalidCoins(format!("coin {} amount is not positive", coin)));
            }
            if let Some(p) = prev {
                if p == coin.denom {
                    return Err(AnteError::InvalidCoins(format!("duplicate denomination {}", coin.denom)));
                }
                if p > coin.denom.as_str() {
                    return Err(AnteError::InvalidCoins(format!("denomination {} is not sorted", coin.denom)));
                }
            }
            prev = Some(&coin.denom);
        }
        Ok(())
    }

    /// True if at least one denom in `other` is covered by an equal or larger
    /// amount here. An empty `other` is never covered.
    pub fn is_any_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .any(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// True if every denom in `other` is covered by an equal or larger amount here.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut merged: Vec<Coin> = self.0.clone();
        for coin in &other.0 {
            match merged.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => existing.amount = existing.amount.checked_add(coin.amount)?,
                None => merged.push(coin.clone()),
            }
        }
        merged.retain(|c| !c.amount.is_zero());
        merged.sort_by(|a, b| a.denom.cmp(&b.denom));
        Some(Coins(merged))
    }

    /// Subtracts `other`, returning `None` if any denom would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.0.clone();
        for coin in &other.0 {
            if coin.amount.is_zero() {
                continue;
            }
            let existing = out.iter_mut().find(|c| c.denom == coin.denom)?;
            existing.amount = existing.amount.checked_sub(coin.amount)?;
        }
        out.retain(|c| !c.amount.is_zero());
        Some(Coins(out))
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

fn is_valid_denom(denom: &str) -> bool {
    let bytes = denom.as_bytes();
    if bytes.len() < 3 || bytes.len() > 128 || !bytes[0].is_ascii_alphabetic() {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'))
}

/// Price of one gas unit in a denomination, fixed point with
/// [`GAS_PRICE_PRECISION`] fractional digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    pub denom: String,
    /// Price scaled by 10^18.
    pub scaled: U256,
}

impl GasPrice {
    /// Fee owed for `gas` units, rounded up.
    pub fn fee_for(&self, gas: u64) -> Coin {
        let one = U256::exp10(GAS_PRICE_PRECISION);
        let product = self.scaled.saturating_mul(U256::from(gas));
        let (quot, rem) = product.div_mod(one);
        let amount = if rem.is_zero() { quot } else { quot.saturating_add(U256::one()) };
        Coin::new(self.denom.clone(), amount)
    }

    pub fn is_zero(&self) -> bool {
        self.scaled.is_zero()
    }
}

impl FromStr for GasPrice {
    type Err = String;

    /// Parses strings such as `0.025stake` or `1uatom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("gas price {s:?} has no denomination"))?;
        let (number, denom) = s.split_at(split);
        if !is_valid_denom(denom) {
            return Err(format!("invalid denom in gas price {s:?}"));
        }

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() || frac_part.len() > GAS_PRICE_PRECISION {
            return Err(format!("invalid decimal in gas price {s:?}"));
        }

        let mut digits = String::with_capacity(int_part.len() + GAS_PRICE_PRECISION);
        digits.push_str(int_part);
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat_n('0', GAS_PRICE_PRECISION - frac_part.len()));
        let scaled = U256::from_dec_str(&digits).map_err(|e| format!("invalid gas price {s:?}: {e:?}"))?;

        Ok(Self {
            denom: denom.to_string(),
            scaled,
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let one = U256::exp10(GAS_PRICE_PRECISION);
        let (int, frac) = self.scaled.div_mod(one);
        let frac = format!("{:0>width$}", frac.to_string(), width = GAS_PRICE_PRECISION);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{}{}", int, self.denom)
        } else {
            write!(f, "{}.{}{}", int, frac, self.denom)
        }
    }
}
