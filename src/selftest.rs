use std::io::{self, Write};

use crate::{
    bank::Bank,
    error::BankError,
    fixedpoint::Money,
    store::MemoryStore,
    transactions::TransactionKind,
};

type Scenario = fn(&mut Bank<MemoryStore>) -> Result<bool, BankError>;

const HUNDRED: Money = Money::from_cents(10000);

const SCENARIOS: [(&str, Scenario); 6] = [
    ("negative initial deposit is rejected", negative_initial_deposit),
    ("deposit adds exactly the amount", deposit_adds_amount),
    ("overdrawing withdrawal changes nothing", overdraw_changes_nothing),
    ("transfer moves funds between accounts", transfer_moves_funds),
    ("oversized transfer changes nothing", oversized_transfer_changes_nothing),
    ("password reset swaps the valid password", reset_swaps_password),
];

/// Runs every scenario against a fresh in-memory ledger and prints one line
/// per scenario. Returns whether all of them passed.
pub fn run(output: &mut impl Write) -> io::Result<bool> {
    let mut all_passed = true;
    for (name, scenario) in SCENARIOS {
        let outcome = Bank::open(MemoryStore::default()).and_then(|mut bank| scenario(&mut bank));
        let passed = matches!(outcome, Ok(true));
        all_passed &= passed;

        match outcome {
            Ok(true) => writeln!(output, "ok      {}", name)?,
            Ok(false) => writeln!(output, "FAILED  {}", name)?,
            Err(e) => writeln!(output, "FAILED  {} ({})", name, e)?,
        }
    }
    Ok(all_passed)
}

fn negative_initial_deposit(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let rejected = matches!(
        bank.create_account("alice", "pw1", Money::from_cents(-1)),
        Err(BankError::InvalidAmount(_))
    );
    Ok(rejected && bank.admin_list_accounts().is_empty())
}

fn deposit_adds_amount(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let alice = bank.create_account("alice", "pw1", HUNDRED)?;
    let before = bank.history(alice)?.len();
    let balance = bank.deposit(alice, Money::from_cents(1234))?;
    let history = bank.history(alice)?;
    Ok(balance == Money::from_cents(11234)
        && history.len() == before + 1
        && history.last().map(|t| t.kind) == Some(TransactionKind::Deposit))
}

fn overdraw_changes_nothing(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let alice = bank.create_account("alice", "pw1", HUNDRED)?;
    let rejected = matches!(
        bank.withdraw(alice, Money::from_cents(15000)),
        Err(BankError::InsufficientFunds { .. })
    );
    let unchanged = bank.balance(alice)? == HUNDRED;
    let withdrawn = bank.withdraw(alice, Money::from_cents(5000))? == Money::from_cents(5000);
    let withdrawals = bank
        .history(alice)?
        .iter()
        .filter(|t| t.kind == TransactionKind::Withdrawal)
        .count();
    Ok(rejected && unchanged && withdrawn && withdrawals == 1)
}

fn transfer_moves_funds(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let x = bank.create_account("x", "pw", HUNDRED)?;
    let y = bank.create_account("y", "pw", Money::ZERO)?;
    bank.transfer(x, y, Money::from_cents(4000))?;
    Ok(bank.balance(x)? == Money::from_cents(6000) && bank.balance(y)? == Money::from_cents(4000))
}

fn oversized_transfer_changes_nothing(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let x = bank.create_account("x", "pw", HUNDRED)?;
    let y = bank.create_account("y", "pw", Money::ZERO)?;
    let rejected = bank.transfer(x, y, Money::from_cents(10001)).is_err();
    Ok(rejected && bank.balance(x)? == HUNDRED && bank.balance(y)? == Money::ZERO)
}

fn reset_swaps_password(bank: &mut Bank<MemoryStore>) -> Result<bool, BankError> {
    let alice = bank.create_account("alice", "pw1", HUNDRED)?;
    bank.reset_password(alice, "pw2")?;
    Ok(bank.authenticate("alice", "pw1").is_err() && bank.authenticate("alice", "pw2")? == alice)
}
