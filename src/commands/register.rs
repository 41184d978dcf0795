use std::error::Error;
use std::io::{stdout, Write};

use clap::Args;
use regex::Regex;

use super::Global;
use crate::report::register::register;
use crate::report::table::TextRenderer;

#[derive(Args)]
pub struct Command {
    filters: Vec<Regex>,
}

impl Command {
    pub fn run(&self, global: &Global) -> Result<(), Box<dyn Error>> {
        let ledger = global.ledger()?;
        let table = register(&ledger, &self.filters, global.start);
        let mut lock = stdout().lock();
        TextRenderer::new(table, None).render(&mut lock)?;
        lock.flush()?;
        Ok(())
    }
}
