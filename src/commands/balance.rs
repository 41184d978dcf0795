use std::error::Error;
use std::io::{stdout, Write};

use clap::Args;
use regex::Regex;

use super::Global;
use crate::report::balance::BalanceReport;
use crate::report::table::TextRenderer;

#[derive(Args)]
pub struct Command {
    /// Number of account levels to show.
    #[arg(short, long)]
    depth: Option<usize>,

    /// Account patterns, matched at the start of the full name.
    filters: Vec<Regex>,
}

impl Command {
    pub fn run(&self, global: &Global) -> Result<(), Box<dyn Error>> {
        let ledger = global.ledger()?;
        let table = BalanceReport {
            filters: &self.filters,
            depth: self.depth,
            market: global.market.as_deref(),
        }
        .build(&ledger.accounts)?;
        let mut lock = stdout().lock();
        TextRenderer::new(table, None).render(&mut lock)?;
        lock.flush()?;
        Ok(())
    }
}
