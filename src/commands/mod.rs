use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::model::Ledger;
use crate::syntax::{self, error::ParserError, parser::Options};

mod balance;
mod register;
mod report;

#[derive(Subcommand)]
pub enum Commands {
    #[command(visible_aliases = ["bal", "b"])]
    Balance(balance::Command),
    #[command(visible_aliases = ["reg", "r"])]
    Register(register::Command),
    #[command(visible_alias = "rep")]
    Report(report::Command),
}

impl Commands {
    pub fn run(&self, global: &Global) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Balance(c) => c.run(global),
            Commands::Register(c) => c.run(global),
            Commands::Report(c) => c.run(global),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    syntax::parse_date(s).ok_or_else(|| format!("invalid date {:?}, want YYYY/MM/DD", s))
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Global {
    /// Journal to read; standard input if unset.
    #[arg(short, long, env = "LEDGER_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Warn about transactions out of date order.
    #[arg(long, global = true)]
    pub sorted: bool,

    /// Ignore transactions before this date.
    #[arg(long, global = true, value_parser = parse_date, value_name = "YYYY/MM/DD")]
    pub start: Option<NaiveDate>,

    /// Stop reading at the first transaction after this date.
    #[arg(long, global = true, value_parser = parse_date, value_name = "YYYY/MM/DD")]
    pub end: Option<NaiveDate>,

    /// Value balances in this currency.
    #[arg(long, global = true, value_name = "CURRENCY")]
    pub market: Option<String>,
}

impl Global {
    pub fn ledger(&self) -> Result<Ledger, ParserError> {
        let options = Options {
            check_sorted: self.sorted,
            end: self.end,
        };
        let ledger = match &self.file {
            Some(path) => syntax::parse_file(path, &options)?,
            None => syntax::parse_stdin(&options)?,
        };
        tracing::debug!(
            "{} transactions from {:?} to {:?}",
            ledger.transactions.len(),
            ledger.min_date(),
            ledger.max_date()
        );
        if self.market.is_some() && ledger.accounts.prices().is_empty() {
            tracing::warn!("no market prices recorded, only {:?} can be valued", self.market);
        }
        Ok(ledger)
    }
}
