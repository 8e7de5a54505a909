mod account;
mod bank;
mod cli;
mod config;
mod error;
mod fixedpoint;
mod hashing;
mod logging;
mod selftest;
mod store;
mod transactions;

use std::{io, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::{bank::Bank, cli::BankingCli, config::Config};

/// Toy bank ledger kept in two flat files
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    #[clap(flatten)]
    config: Config,

    #[clap(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Mode {
    /// Interactive menu (default)
    Cli,
    /// Run the ledger checks against an in-memory store
    SelfTest,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    match args.mode.unwrap_or(Mode::Cli) {
        Mode::Cli => match run_cli(&args.config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "Banking session aborted");
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        Mode::SelfTest => match selftest::run(&mut io::stdout()) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run_cli(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let bank = Bank::open(config.open_store()?)?;
    info!(
        accounts = %bank.store().accounts_path().display(),
        transactions = %bank.store().transactions_path().display(),
        "Ledger opened"
    );
    let stdin = io::stdin();
    let mut cli = BankingCli::new(bank, config.admin_password.clone(), stdin.lock(), io::stdout());
    cli.run()?;
    Ok(())
}
