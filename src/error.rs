use std::path::PathBuf;

use thiserror::Error;

use crate::{account::AccountId, fixedpoint::Money};

/// Rejections from parsing a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a valid amount")]
    Malformed(String),
    #[error("'{0}' has more than two digits past the point")]
    TooPrecise(String),
    #[error("'{0}' is out of range")]
    OutOfRange(String),
}

/// Failures of the flat-file backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write records to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Every way a ledger operation can be refused.
///
/// The `Display` output is what the CLI shows the user.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("An account named '{0}' already exists")]
    DuplicateName(String),
    #[error("Account {0} not found")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),
    #[error("Insufficient funds: balance is {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },
    #[error("Cannot transfer to the same account")]
    SameAccount,
    #[error("Name required")]
    EmptyName,
    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl BankError {
    pub fn not_found(id: AccountId) -> Self {
        BankError::NotFound(id.to_string())
    }
}
