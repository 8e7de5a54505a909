/*!
 * Interactive menu over the ledger.
 *
 * Reads answers line by line from any `BufRead` and prints to any `Write`,
 * so a session can be scripted in tests. Every decision about money and
 * credentials is made by `Bank`; this only prompts and renders.
 */
use std::io::{self, BufRead, Write};

use chrono::Local;
use thiserror::Error;

use crate::{
    account::AccountId,
    bank::{Bank, LoginKind},
    error::BankError,
    fixedpoint::Money,
    hashing::PasswordHasher,
    store::LedgerStore,
};

const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Error)]
enum Interrupt {
    #[error("end of input")]
    EndOfInput,
    #[error(transparent)]
    Io(#[from] io::Error),
}

type Step<T = ()> = Result<T, Interrupt>;

pub struct BankingCli<S, H, R, W> {
    bank: Bank<S, H>,
    admin_password: String,
    input: R,
    output: W,
}

impl<S: LedgerStore, H: PasswordHasher, R: BufRead, W: Write> BankingCli<S, H, R, W> {
    pub fn new(bank: Bank<S, H>, admin_password: impl Into<String>, input: R, output: W) -> Self {
        BankingCli {
            bank,
            admin_password: admin_password.into(),
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn into_bank(self) -> Bank<S, H> {
        self.bank
    }

    /// Runs the main menu until the user exits or input runs out.
    pub fn run(&mut self) -> io::Result<()> {
        match self.main_menu() {
            Ok(()) => Ok(()),
            Err(Interrupt::EndOfInput) => {
                writeln!(self.output, "\nExiting...")?;
                Ok(())
            }
            Err(Interrupt::Io(e)) => Err(e),
        }
    }

    fn main_menu(&mut self) -> Step {
        loop {
            let now = Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(self.output, "\n=== Banking System === ({})", now)?;
            writeln!(self.output, "1. Create Account")?;
            writeln!(self.output, "2. Login")?;
            writeln!(self.output, "3. Forget Password")?;
            writeln!(self.output, "4. Admin Panel")?;
            writeln!(self.output, "5. Exit")?;

            match self.prompt("Enter choice: ")?.as_str() {
                "1" => self.create_account()?,
                "2" => self.login()?,
                "3" => self.forget_password()?,
                "4" => self.admin_panel()?,
                "5" => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    fn create_account(&mut self) -> Step {
        let name = self.prompt("Enter your name: ")?;
        if name.is_empty() {
            return self.report(BankError::EmptyName);
        }
        let initial_deposit = match self.prompt("Enter initial deposit: ")?.parse::<Money>() {
            Ok(amount) if !amount.is_negative() => amount,
            _ => return self.say("Invalid deposit"),
        };
        let password = self.prompt_secret(&format!("Enter password (min {} chars): ", MIN_PASSWORD_LEN))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return self.say("Password too short");
        }

        match self.bank.create_account(&name, &password, initial_deposit) {
            Ok(id) => self.say(&format!("Account created successfully! Account Number: {}", id)),
            Err(e) => self.report(e),
        }
    }

    fn login(&mut self) -> Step {
        let id = self.prompt("Enter account number: ")?;
        let password = self.prompt_secret("Enter password: ")?;
        let id = match id.parse::<AccountId>() {
            Ok(id) => id,
            Err(_) => return self.say("Account not found"),
        };

        match self.bank.login(id, &password) {
            Ok(LoginKind::Password) => {
                self.say("Login successful")?;
                self.user_menu(id)
            }
            Ok(LoginKind::TemporaryPassword) => {
                self.say("Logged in with temporary password, you must set a new password now.")?;
                self.choose_new_password(id)?;
                self.user_menu(id)
            }
            Err(e) => self.report(e),
        }
    }

    fn choose_new_password(&mut self, id: AccountId) -> Step {
        loop {
            let new_password = self.prompt_secret("Enter new password: ")?;
            if new_password.chars().count() < MIN_PASSWORD_LEN {
                self.say("Password too short")?;
                continue;
            }
            if self.prompt_secret("Confirm new password: ")? != new_password {
                self.say("Passwords do not match")?;
                continue;
            }
            return match self.bank.reset_password(id, &new_password) {
                Ok(()) => self.say("Password updated"),
                Err(e) => self.report(e),
            };
        }
    }

    fn forget_password(&mut self) -> Step {
        let id = match self.prompt("Enter your account number: ")?.parse::<AccountId>() {
            Ok(id) => id,
            Err(_) => return self.say("Account not found"),
        };
        match self.bank.generate_temporary_password(id) {
            Ok(temporary) => self.say(&format!(
                "Your temporary password is: {}. Use it to login and change your password immediately.",
                temporary
            )),
            Err(e) => self.report(e),
        }
    }

    fn user_menu(&mut self, id: AccountId) -> Step {
        loop {
            let balance = match self.bank.balance(id) {
                Ok(balance) => balance,
                Err(e) => return self.report(e),
            };
            writeln!(self.output, "\nAccount: {} | Balance: {}", id, balance)?;
            writeln!(self.output, "1. Deposit")?;
            writeln!(self.output, "2. Withdraw")?;
            writeln!(self.output, "3. Transfer")?;
            writeln!(self.output, "4. Change Password")?;
            writeln!(self.output, "5. Transactions")?;
            writeln!(self.output, "6. Logout")?;

            match self.prompt("Enter choice: ")?.as_str() {
                "1" => self.deposit(id)?,
                "2" => self.withdraw(id)?,
                "3" => self.transfer(id)?,
                "4" => self.change_password(id)?,
                "5" => self.show_history(id)?,
                "6" => return Ok(()),
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    fn deposit(&mut self, id: AccountId) -> Step {
        let Some(amount) = self.prompt_amount("Enter amount to deposit: ")? else {
            return Ok(());
        };
        match self.bank.deposit(id, amount) {
            Ok(balance) => self.say(&format!("Deposit successful, new balance: {}", balance)),
            Err(e) => self.report(e),
        }
    }

    fn withdraw(&mut self, id: AccountId) -> Step {
        let Some(amount) = self.prompt_amount("Enter amount to withdraw: ")? else {
            return Ok(());
        };
        match self.bank.withdraw(id, amount) {
            Ok(balance) => self.say(&format!("Withdrawal successful, new balance: {}", balance)),
            Err(e) => self.report(e),
        }
    }

    fn transfer(&mut self, id: AccountId) -> Step {
        let recipient = match self.prompt("Recipient account number: ")?.parse::<AccountId>() {
            Ok(recipient) => recipient,
            Err(_) => return self.say("Recipient not found"),
        };
        let Some(amount) = self.prompt_amount("Enter amount to transfer: ")? else {
            return Ok(());
        };
        match self.bank.transfer(id, recipient, amount) {
            Ok(_) => self.say("Transfer complete"),
            Err(e) => self.report(e),
        }
    }

    fn change_password(&mut self, id: AccountId) -> Step {
        let current = self.prompt_secret("Enter current password: ")?;
        let new_password = self.prompt_secret("Enter new password: ")?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return self.say("Password too short");
        }
        match self.bank.change_password(id, &current, &new_password) {
            Ok(()) => self.say("Password changed"),
            Err(BankError::InvalidCredentials) => self.say("Incorrect current password"),
            Err(e) => self.report(e),
        }
    }

    fn show_history(&mut self, id: AccountId) -> Step {
        let history = match self.bank.history(id) {
            Ok(history) => history,
            Err(e) => return self.report(e),
        };
        if history.is_empty() {
            return self.say("No transactions");
        }
        writeln!(self.output, "\nTransactions:")?;
        for transaction in history {
            writeln!(
                self.output,
                "{}\t{}\t{}\t{}",
                transaction.kind,
                transaction.amount,
                transaction.timestamp.format("%Y-%m-%d %H:%M:%S"),
                transaction.balance.map(|balance| balance.to_string()).unwrap_or_default()
            )?;
        }
        Ok(())
    }

    fn admin_panel(&mut self) -> Step {
        if self.prompt("Enter admin password: ")? != self.admin_password {
            return self.say("Access denied");
        }

        writeln!(self.output, "\n--- Admin Panel ---")?;
        for account in self.bank.admin_list_accounts() {
            writeln!(self.output, "{}: {} | Balance: {}", account.id, account.name, account.balance)?;
        }

        let action = self.prompt("(R)eset password / (D)elete account / Enter to exit: ")?;
        match action.to_lowercase().as_str() {
            "r" => {
                let id = match self.prompt("Account number to reset: ")?.parse::<AccountId>() {
                    Ok(id) => id,
                    Err(_) => return self.say("Account not found"),
                };
                match self.bank.generate_temporary_password(id) {
                    Ok(temporary) => self.say(&format!("Temporary password for {}: {}", id, temporary)),
                    Err(e) => self.report(e),
                }
            }
            "d" => {
                let raw = self.prompt("Account number to delete: ")?;
                let confirm = self.prompt(&format!("Are you sure you want to delete {}? (yes/no): ", raw))?;
                if confirm.to_lowercase() != "yes" {
                    return Ok(());
                }
                let id = match raw.parse::<AccountId>() {
                    Ok(id) => id,
                    Err(_) => return self.say("Account not found"),
                };
                match self.bank.admin_delete_account(id) {
                    Ok(_) => self.say(&format!("Account {} deleted", id)),
                    Err(e) => self.report(e),
                }
            }
            _ => Ok(()),
        }
    }

    /// `None` once the user has been told the amount is unusable.
    fn prompt_amount(&mut self, label: &str) -> Step<Option<Money>> {
        match self.prompt(label)?.parse::<Money>() {
            Ok(amount) => Ok(Some(amount)),
            Err(_) => {
                self.say("Invalid amount")?;
                Ok(None)
            }
        }
    }

    fn prompt(&mut self, label: &str) -> Step<String> {
        Ok(self.read_line(label)?.trim().to_owned())
    }

    /// Passwords are taken as typed, spaces included.
    fn prompt_secret(&mut self, label: &str) -> Step<String> {
        let mut line = self.read_line(label)?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn read_line(&mut self, label: &str) -> Step<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Interrupt::EndOfInput);
        }
        Ok(line)
    }

    fn say(&mut self, message: &str) -> Step {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    fn report(&mut self, error: BankError) -> Step {
        writeln!(self.output, "{}", error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::store::MemoryStore;

    const HUNDRED: Money = Money::from_cents(10000);

    fn run_script(bank: Bank<MemoryStore>, script: &str) -> (Bank<MemoryStore>, String) {
        let mut output = Vec::new();
        let mut cli = BankingCli::new(bank, "admin123", Cursor::new(script.to_owned()), &mut output);
        cli.run().unwrap();
        let bank = cli.into_bank();
        (bank, String::from_utf8(output).unwrap())
    }

    fn bank_with_alice() -> (Bank<MemoryStore>, AccountId) {
        let mut bank = Bank::open(MemoryStore::default()).unwrap();
        let alice = bank.create_account("alice", "pw12", HUNDRED).unwrap();
        (bank, alice)
    }

    #[test]
    fn exit_says_goodbye() {
        let (_, output) = run_script(Bank::open(MemoryStore::default()).unwrap(), "5\n");
        assert!(output.contains("=== Banking System ==="));
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (_, output) = run_script(Bank::open(MemoryStore::default()).unwrap(), "9\n");
        assert!(output.contains("Invalid choice"));
        assert!(output.ends_with("Exiting...\n"));
    }

    #[test]
    fn create_account_from_prompts() {
        let (bank, output) = run_script(
            Bank::open(MemoryStore::default()).unwrap(),
            "1\nbob\n25.50\nsecret\n5\n",
        );

        assert!(output.contains("Account created successfully! Account Number: "));
        let id = bank.authenticate("bob", "secret").unwrap();
        assert_eq!(bank.balance(id).unwrap(), Money::from_cents(2550));
    }

    #[test]
    fn passwords_keep_surrounding_spaces() {
        let (bank, output) = run_script(
            Bank::open(MemoryStore::default()).unwrap(),
            "1\n  bob  \n10\n ab \r\n5\n",
        );

        assert!(!output.contains("Password too short"));
        let id = bank.authenticate("bob", " ab ").unwrap();
        assert!(bank.authenticate("bob", "ab").is_err());

        let (_, output) = run_script(bank, &format!("2\n{}\n ab \n6\n2\n{}\nab\n5\n", id, id));
        assert_eq!(output.matches("Login successful").count(), 1);
        assert!(output.contains("Invalid credentials"));
    }

    #[test]
    fn create_account_rejects_short_password_and_bad_deposit() {
        let (bank, output) = run_script(
            Bank::open(MemoryStore::default()).unwrap(),
            "1\nbob\n10\npw\n1\nbob\n-5\n5\n",
        );

        assert!(output.contains("Password too short"));
        assert!(output.contains("Invalid deposit"));
        assert!(bank.admin_list_accounts().is_empty());
    }

    #[test]
    fn deposit_withdraw_and_history() {
        let (bank, alice) = bank_with_alice();
        let script = format!("2\n{}\npw12\n1\n20\n2\n500\n2\n70\n5\n6\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains("Login successful"));
        assert!(output.contains("Deposit successful, new balance: 120.00"));
        assert!(output.contains("Insufficient funds"));
        assert!(output.contains("Withdrawal successful, new balance: 50.00"));
        assert!(output.contains("Withdrawal\t70.00\t"));
        assert_eq!(bank.balance(alice).unwrap(), Money::from_cents(5000));
    }

    #[test]
    fn invalid_amounts_are_reported() {
        let (bank, alice) = bank_with_alice();
        let script = format!("2\n{}\npw12\n1\nabc\n1\n0\n6\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains("Invalid amount\n"));
        assert!(output.contains("Invalid amount: 0.00"));
        assert_eq!(bank.balance(alice).unwrap(), HUNDRED);
    }

    #[test]
    fn transfer_between_accounts() {
        let (mut bank, alice) = bank_with_alice();
        let bob = bank.create_account("bob", "pw12", Money::ZERO).unwrap();
        let script = format!("2\n{}\npw12\n3\n{}\n40\n3\nnope\n6\n5\n", alice, bob);
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains("Transfer complete"));
        assert!(output.contains("Recipient not found"));
        assert_eq!(bank.balance(alice).unwrap(), Money::from_cents(6000));
        assert_eq!(bank.balance(bob).unwrap(), Money::from_cents(4000));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let (bank, alice) = bank_with_alice();
        let script = format!("2\n{}\nnope\n2\n000001\npw12\n5\n", alice);
        let (_, output) = run_script(bank, &script);

        assert!(output.contains("Invalid credentials"));
        assert!(output.contains("Account 1 not found"));
        assert!(!output.contains("Login successful"));
    }

    #[test]
    fn change_password_checks_current() {
        let (bank, alice) = bank_with_alice();
        let script = format!("2\n{}\npw12\n4\nwrong\nnewpass\n4\npw12\nnewpass\n6\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains("Incorrect current password"));
        assert!(output.contains("Password changed"));
        assert_eq!(bank.login(alice, "newpass").unwrap(), LoginKind::Password);
    }

    #[test]
    fn temporary_password_forces_new_one_at_login() {
        let (mut bank, alice) = bank_with_alice();
        let temporary = bank.generate_temporary_password(alice).unwrap();
        let script = format!(
            "2\n{}\n{}\nab\nfresh\nother\nfresh\nfresh\n6\n5\n",
            alice, temporary
        );
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains("you must set a new password now"));
        assert!(output.contains("Password too short"));
        assert!(output.contains("Passwords do not match"));
        assert!(output.contains("Password updated"));
        assert_eq!(bank.login(alice, "fresh").unwrap(), LoginKind::Password);
    }

    #[test]
    fn forget_password_prints_temporary() {
        let (bank, alice) = bank_with_alice();
        let script = format!("3\n{}\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        let temporary = output
            .split("Your temporary password is: ")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .unwrap();
        assert_eq!(bank.login(alice, temporary).unwrap(), LoginKind::TemporaryPassword);
    }

    #[test]
    fn admin_requires_password() {
        let (bank, _) = bank_with_alice();
        let (_, output) = run_script(bank, "4\nguess\n5\n");

        assert!(output.contains("Access denied"));
        assert!(!output.contains("--- Admin Panel ---"));
    }

    #[test]
    fn admin_lists_and_deletes() {
        let (bank, alice) = bank_with_alice();
        let script = format!("4\nadmin123\nd\n{}\nyes\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        assert!(output.contains(&format!("{}: alice | Balance: 100.00", alice)));
        assert!(output.contains(&format!("Account {} deleted", alice)));
        assert!(bank.admin_list_accounts().is_empty());
    }

    #[test]
    fn admin_delete_needs_confirmation() {
        let (bank, alice) = bank_with_alice();
        let script = format!("4\nadmin123\nd\n{}\nno\n5\n", alice);
        let (bank, _) = run_script(bank, &script);

        assert_eq!(bank.admin_list_accounts().len(), 1);
    }

    #[test]
    fn admin_reset_issues_temporary_password() {
        let (bank, alice) = bank_with_alice();
        let script = format!("4\nadmin123\nr\n{}\n5\n", alice);
        let (bank, output) = run_script(bank, &script);

        let prefix = format!("Temporary password for {}: ", alice);
        let temporary = output
            .split(prefix.as_str())
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap();
        assert_eq!(bank.login(alice, temporary).unwrap(), LoginKind::TemporaryPassword);
    }
}
