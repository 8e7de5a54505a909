use std::path::PathBuf;

use crate::{error::StoreError, store::CsvStore};

/// Where the ledger lives and who may administer it.
#[derive(clap::Args, Debug, Clone)]
pub struct Config {
    /// Accounts table
    #[clap(long = "accounts", env = "BANK_ACCOUNTS_FILE", default_value = "accounts.txt")]
    pub accounts_path: PathBuf,

    /// Transaction log
    #[clap(long = "transactions", env = "BANK_TRANSACTIONS_FILE", default_value = "transactions.txt")]
    pub transactions_path: PathBuf,

    /// Password guarding the admin panel
    #[clap(long, env = "BANK_ADMIN_PASSWORD", default_value = "admin123", hide_env_values = true)]
    pub admin_password: String,
}

impl Config {
    pub fn open_store(&self) -> Result<CsvStore, StoreError> {
        CsvStore::open(&self.accounts_path, &self.transactions_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Wrapper {
        #[clap(flatten)]
        config: Config,
    }

    #[test]
    fn explicit_paths_are_used() {
        let wrapper = Wrapper::try_parse_from([
            "toy-ledger",
            "--accounts",
            "/tmp/a.csv",
            "--transactions",
            "/tmp/t.csv",
            "--admin-password",
            "hunter2",
        ])
        .unwrap();

        assert_eq!(wrapper.config.accounts_path, PathBuf::from("/tmp/a.csv"));
        assert_eq!(wrapper.config.transactions_path, PathBuf::from("/tmp/t.csv"));
        assert_eq!(wrapper.config.admin_password, "hunter2");
    }

    #[test]
    fn open_store_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            accounts_path: dir.path().join("accounts.txt"),
            transactions_path: dir.path().join("transactions.txt"),
            admin_password: "admin123".to_owned(),
        };

        config.open_store().unwrap();
        assert!(config.accounts_path.exists());
        assert!(config.transactions_path.exists());
    }
}
