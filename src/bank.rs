use std::collections::BTreeMap;

use rand::Rng;
use tracing::{info, warn};

use crate::{
    account::{Account, AccountId},
    error::BankError,
    fixedpoint::Money,
    hashing::{PasswordHasher, Sha256Hasher},
    store::LedgerStore,
    transactions::{Transaction, TransactionKind},
};

/// Appended to a temporary password before hashing so logins can recognise it.
const TEMPORARY_MARKER: &str = "_TEMP";

/// How a successful login was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    Password,
    /// The account holder should pick a new password before going on.
    TemporaryPassword,
}

/**
 * The account ledger.
 *
 * Accounts live in memory and every mutation is written through to the
 * store before it becomes visible, so a failed write leaves the ledger
 * as it was. Transactions are only ever appended to the store, and a
 * balance change whose log entries cannot be appended is undone.
 */
pub struct Bank<S, H = Sha256Hasher> {
    accounts: BTreeMap<AccountId, Account>,
    store: S,
    hasher: H,
}

impl<S: LedgerStore> Bank<S> {
    pub fn open(store: S) -> Result<Self, BankError> {
        Self::with_hasher(store, Sha256Hasher)
    }
}

impl<S: LedgerStore, H: PasswordHasher> Bank<S, H> {
    pub fn with_hasher(store: S, hasher: H) -> Result<Self, BankError> {
        let mut accounts: BTreeMap<AccountId, Account> = BTreeMap::new();
        for account in store.load_accounts()? {
            if accounts.contains_key(&account.id) {
                warn!(account = %account.id, "Dropped duplicate account number");
                continue;
            }
            if accounts.values().any(|known| known.name == account.name) {
                warn!(account = %account.id, holder = %account.name, "Dropped duplicate account name");
                continue;
            }
            if account.balance.is_negative() {
                warn!(account = %account.id, "Dropped account with negative balance");
                continue;
            }
            accounts.insert(account.id, account);
        }
        info!(accounts = accounts.len(), "Ledger loaded");

        Ok(Bank {
            accounts,
            store,
            hasher,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn account(&self, id: AccountId) -> Result<&Account, BankError> {
        self.accounts.get(&id).ok_or_else(|| BankError::not_found(id))
    }

    pub fn balance(&self, id: AccountId) -> Result<Money, BankError> {
        self.account(id).map(|account| account.balance)
    }

    pub fn create_account(
        &mut self,
        name: &str,
        password: &str,
        initial_deposit: Money,
    ) -> Result<AccountId, BankError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BankError::EmptyName);
        }
        if initial_deposit.is_negative() {
            return Err(BankError::InvalidAmount(initial_deposit));
        }
        if self.accounts.values().any(|account| account.name == name) {
            return Err(BankError::DuplicateName(name.to_owned()));
        }

        let id = AccountId::generate(|candidate| self.accounts.contains_key(&candidate));
        let account = Account {
            id,
            name: name.to_owned(),
            password_hash: self.hasher.hash(password),
            balance: initial_deposit,
        };
        let mut entries = Vec::new();
        if initial_deposit.is_positive() {
            entries.push(Transaction::now(
                id,
                TransactionKind::Deposit,
                initial_deposit,
                initial_deposit,
            ));
        }
        self.apply(vec![account], entries)?;
        info!(account = %id, holder = name, "Account created");
        Ok(id)
    }

    /// Looks the account up by holder name.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<AccountId, BankError> {
        let account = self
            .accounts
            .values()
            .find(|account| account.name == name.trim())
            .ok_or_else(|| BankError::NotFound(name.trim().to_owned()))?;
        self.check_password(account, password)
            .map(|_| account.id)
            .ok_or(BankError::InvalidCredentials)
    }

    /// Looks the account up by account number.
    pub fn login(&self, id: AccountId, password: &str) -> Result<LoginKind, BankError> {
        let account = self.account(id)?;
        self.check_password(account, password)
            .ok_or(BankError::InvalidCredentials)
    }

    pub fn deposit(&mut self, id: AccountId, amount: Money) -> Result<Money, BankError> {
        ensure_positive(amount)?;
        let mut account = self.account(id)?.clone();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(BankError::InvalidAmount(amount))?;

        let balance = account.balance;
        let entry = Transaction::now(id, TransactionKind::Deposit, amount, balance);
        self.apply(vec![account], vec![entry])?;
        info!(account = %id, %amount, %balance, "Deposit");
        Ok(balance)
    }

    pub fn withdraw(&mut self, id: AccountId, amount: Money) -> Result<Money, BankError> {
        ensure_positive(amount)?;
        let mut account = self.account(id)?.clone();
        account.balance = debit(account.balance, amount)?;

        let balance = account.balance;
        let entry = Transaction::now(id, TransactionKind::Withdrawal, amount, balance);
        self.apply(vec![account], vec![entry])?;
        info!(account = %id, %amount, %balance, "Withdrawal");
        Ok(balance)
    }

    /// Moves funds between two accounts and returns the new source balance.
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Money) -> Result<Money, BankError> {
        if from == to {
            return Err(BankError::SameAccount);
        }
        ensure_positive(amount)?;
        let mut source = self.account(from)?.clone();
        let mut destination = self.account(to)?.clone();

        source.balance = debit(source.balance, amount)?;
        destination.balance = destination
            .balance
            .checked_add(amount)
            .ok_or(BankError::InvalidAmount(amount))?;

        let (source_balance, destination_balance) = (source.balance, destination.balance);
        let entries = vec![
            Transaction::now(from, TransactionKind::TransferOut, amount, source_balance),
            Transaction::now(to, TransactionKind::TransferIn, amount, destination_balance),
        ];
        self.apply(vec![source, destination], entries)?;
        info!(%from, %to, %amount, "Transfer");
        Ok(source_balance)
    }

    pub fn reset_password(&mut self, id: AccountId, new_password: &str) -> Result<(), BankError> {
        let mut account = self.account(id)?.clone();
        account.password_hash = self.hasher.hash(new_password);
        self.commit(vec![account])?;
        info!(account = %id, "Password reset");
        Ok(())
    }

    pub fn change_password(
        &mut self,
        id: AccountId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), BankError> {
        match self.login(id, current_password)? {
            LoginKind::Password => self.reset_password(id, new_password),
            LoginKind::TemporaryPassword => Err(BankError::InvalidCredentials),
        }
    }

    /// Replaces the password with a random one and hands back its plaintext.
    ///
    /// Nothing here forces the holder to change it afterwards; logins with it
    /// report [`LoginKind::TemporaryPassword`] until they do.
    pub fn generate_temporary_password(&mut self, id: AccountId) -> Result<String, BankError> {
        let mut account = self.account(id)?.clone();
        let temporary = format!("TEMP{}", rand::thread_rng().gen_range(1000..=9999));
        account.password_hash = self.hasher.hash(&format!("{}{}", temporary, TEMPORARY_MARKER));
        self.commit(vec![account])?;
        info!(account = %id, "Temporary password issued");
        Ok(temporary)
    }

    /// The account's entries of the transaction log, oldest first.
    pub fn history(&self, id: AccountId) -> Result<Vec<Transaction>, BankError> {
        Ok(self
            .store
            .load_transactions()?
            .into_iter()
            .filter(|transaction| transaction.account_id == id)
            .collect())
    }

    pub fn admin_list_accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    /// Removes the account. Its transactions stay in the log.
    pub fn admin_delete_account(&mut self, id: AccountId) -> Result<Account, BankError> {
        let mut remaining = self.accounts.clone();
        let removed = remaining.remove(&id).ok_or_else(|| BankError::not_found(id))?;
        self.persist(remaining)?;
        info!(account = %id, "Account deleted");
        Ok(removed)
    }

    fn check_password(&self, account: &Account, password: &str) -> Option<LoginKind> {
        if self.hasher.verify(password, &account.password_hash) {
            Some(LoginKind::Password)
        } else if self
            .hasher
            .verify(&format!("{}{}", password, TEMPORARY_MARKER), &account.password_hash)
        {
            Some(LoginKind::TemporaryPassword)
        } else {
            None
        }
    }

    fn commit(&mut self, changed: Vec<Account>) -> Result<(), BankError> {
        let mut updated = self.accounts.clone();
        for account in changed {
            updated.insert(account.id, account);
        }
        self.persist(updated)
    }

    fn persist(&mut self, accounts: BTreeMap<AccountId, Account>) -> Result<(), BankError> {
        let rows: Vec<Account> = accounts.values().cloned().collect();
        self.store.save_accounts(&rows)?;
        self.accounts = accounts;
        Ok(())
    }

    /// Saves the changed accounts, then appends their log entries in one
    /// write. If the append fails the previous accounts table is put back.
    fn apply(&mut self, changed: Vec<Account>, entries: Vec<Transaction>) -> Result<(), BankError> {
        let previous = self.accounts.clone();
        self.commit(changed)?;
        if entries.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.store.append_transactions(&entries) {
            if let Err(rollback) = self.persist(previous) {
                warn!(error = %rollback, "Could not restore accounts after failed log append");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

fn ensure_positive(amount: Money) -> Result<(), BankError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(BankError::InvalidAmount(amount))
    }
}

fn debit(balance: Money, amount: Money) -> Result<Money, BankError> {
    if amount > balance {
        return Err(BankError::InsufficientFunds {
            balance,
            requested: amount,
        });
    }
    balance
        .checked_sub(amount)
        .ok_or(BankError::InvalidAmount(amount))
}
