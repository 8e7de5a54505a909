use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{account::Account, error::StoreError, transactions::Transaction};

const ACCOUNT_HEADERS: [&str; 4] = ["AccountNumber", "Name", "PasswordHash", "Balance"];
const TRANSACTION_HEADERS: [&str; 5] = ["AccountNumber", "Type", "Amount", "DateTime", "Balance"];

/// Backing store of the ledger: the accounts table is read whole and
/// overwritten whole, the transaction log is read whole and appended to.
pub trait LedgerStore {
    fn load_accounts(&self) -> Result<Vec<Account>, StoreError>;
    fn save_accounts(&mut self, accounts: &[Account]) -> Result<(), StoreError>;
    fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError>;
    /// Appends the entries as one write: either all of them land or the
    /// call fails.
    fn append_transactions(&mut self, transactions: &[Transaction]) -> Result<(), StoreError>;
}

/// Keeps both tables in memory, nothing touches the disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl LedgerStore for MemoryStore {
    fn load_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.accounts.clone())
    }

    fn save_accounts(&mut self, accounts: &[Account]) -> Result<(), StoreError> {
        self.accounts = accounts.to_vec();
        Ok(())
    }

    fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.transactions.clone())
    }

    fn append_transactions(&mut self, transactions: &[Transaction]) -> Result<(), StoreError> {
        self.transactions.extend_from_slice(transactions);
        Ok(())
    }
}

/**
 * Two comma separated flat files with a header row each.
 *
 * A table that cannot be read is treated as empty, and rows that do not
 * parse are dropped with a warning. Only failing writes are errors.
 */
#[derive(Debug, Clone)]
pub struct CsvStore {
    accounts_path: PathBuf,
    transactions_path: PathBuf,
}

impl CsvStore {
    /// Creates either file with just its header row if it is missing or empty.
    pub fn open(
        accounts_path: impl Into<PathBuf>,
        transactions_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let store = CsvStore {
            accounts_path: accounts_path.into(),
            transactions_path: transactions_path.into(),
        };
        ensure_table(&store.accounts_path, &ACCOUNT_HEADERS)?;
        ensure_table(&store.transactions_path, &TRANSACTION_HEADERS)?;
        check_headers(&store.accounts_path, &ACCOUNT_HEADERS);
        check_headers(&store.transactions_path, &TRANSACTION_HEADERS);
        Ok(store)
    }

    pub fn accounts_path(&self) -> &Path {
        &self.accounts_path
    }

    pub fn transactions_path(&self) -> &Path {
        &self.transactions_path
    }
}

impl LedgerStore for CsvStore {
    fn load_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(read_table(&self.accounts_path))
    }

    fn save_accounts(&mut self, accounts: &[Account]) -> Result<(), StoreError> {
        let path = &self.accounts_path;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let csv_error = |source: csv::Error| StoreError::Csv {
            path: tmp.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)
            .map_err(csv_error)?;
        writer.write_record(ACCOUNT_HEADERS).map_err(csv_error)?;
        for account in accounts {
            writer.serialize(account).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        drop(writer);

        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), count = accounts.len(), "accounts table written");
        Ok(())
    }

    fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(read_table(&self.transactions_path))
    }

    fn append_transactions(&mut self, transactions: &[Transaction]) -> Result<(), StoreError> {
        let path = &self.transactions_path;
        ensure_table(path, &TRANSACTION_HEADERS)?;

        let csv_error = |source: csv::Error| StoreError::Csv {
            path: path.clone(),
            source,
        };
        let mut rows = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for transaction in transactions {
            rows.serialize(transaction).map_err(csv_error)?;
        }
        let io_error = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        let rows = rows.into_inner().map_err(|e| io_error(e.into_error()))?;

        let mut file = OpenOptions::new().append(true).open(path).map_err(io_error)?;
        file.write_all(&rows).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        debug!(path = %path.display(), count = transactions.len(), "transactions appended");
        Ok(())
    }
}

fn ensure_table(path: &Path, headers: &[&str]) -> Result<(), StoreError> {
    let is_empty = fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);
    if !is_empty {
        return Ok(());
    }

    let csv_error = |source: csv::Error| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(headers).map_err(csv_error)?;
    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "created empty table");
    Ok(())
}

/// Rows are matched to fields by header name, so a table with an older
/// layout still loads. It is only worth a warning.
fn check_headers(path: &Path, expected: &[&str]) {
    let headers = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .and_then(|mut reader| reader.headers().cloned());
    if let Ok(headers) = headers {
        if !headers.iter().eq(expected.iter().copied()) {
            warn!(
                path = %path.display(),
                found = ?headers.iter().collect::<Vec<_>>(),
                expected = ?expected,
                "table header differs from the current layout"
            );
        }
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path);

    let mut reader = match reader {
        Ok(reader) => reader,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "table unreadable, starting empty");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for row in reader.deserialize() {
        match row {
            Ok(record) => records.push(record),
            Err(e) if e.is_io_error() => {
                warn!(path = %path.display(), error = %e, "table unreadable, starting empty");
                return Vec::new();
            }
            Err(e) => warn!(path = %path.display(), error = %e, "dropped malformed row"),
        }
    }
    records
}
