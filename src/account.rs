use std::{fmt::Display, num::ParseIntError, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fixedpoint::Money;

const ACCOUNT_NUMBER_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

/// Six digit account number handed out at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u32);

impl AccountId {
    #[cfg(test)]
    pub const fn new(number: u32) -> Self {
        AccountId(number)
    }

    /// Draws random account numbers until one is not taken.
    pub fn generate(mut is_taken: impl FnMut(AccountId) -> bool) -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = AccountId(rng.gen_range(ACCOUNT_NUMBER_RANGE));
            if !is_taken(candidate) {
                return candidate;
            }
        }
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AccountId)
    }
}

/// One row of the accounts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "AccountNumber")]
    pub id: AccountId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PasswordHash")]
    pub password_hash: String,
    #[serde(rename = "Balance")]
    pub balance: Money,
}
