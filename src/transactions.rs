use std::fmt::Display;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{account::AccountId, fixedpoint::Money};

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    #[serde(rename = "Deposit")]
    Deposit,
    #[serde(rename = "Withdrawal")]
    Withdrawal,
    #[serde(rename = "Transfer In")]
    TransferIn,
    #[serde(rename = "Transfer Out")]
    TransferOut,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
            TransactionKind::TransferIn => "Transfer In",
            TransactionKind::TransferOut => "Transfer Out",
        })
    }
}

/**
 * One line of the append-only transaction log.
 *
 * `balance` is the account balance right after the transaction was applied.
 * Logs written before that column existed have no balance on their rows.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "AccountNumber")]
    pub account_id: AccountId,
    #[serde(rename = "Type")]
    pub kind: TransactionKind,
    #[serde(rename = "Amount")]
    pub amount: Money,
    #[serde(rename = "DateTime", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Balance", default)]
    pub balance: Option<Money>,
}

impl Transaction {
    /// Stamps the record with the current local time, truncated to seconds.
    pub fn now(account_id: AccountId, kind: TransactionKind, amount: Money, balance: Money) -> Self {
        let now = Local::now().naive_local();
        Transaction {
            account_id,
            kind,
            amount,
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            balance: Some(balance),
        }
    }
}

pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&timestamp.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(de::Error::custom)
    }
}
