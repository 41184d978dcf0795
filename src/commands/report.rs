use std::error::Error;
use std::io::{stdout, Write};

use clap::Args;
use regex::Regex;

use super::Global;
use crate::model::periodic::Interval;
use crate::report::period::PeriodReport;
use crate::report::table::TextRenderer;

#[derive(Args)]
pub struct Command {
    #[command(flatten)]
    period: PeriodArgs,

    filters: Vec<Regex>,
}

impl Command {
    pub fn run(&self, global: &Global) -> Result<(), Box<dyn Error>> {
        let ledger = global.ledger()?;
        let table = PeriodReport {
            filters: &self.filters,
            interval: self.period.to_interval(),
            start: global.start,
            market: global.market.as_deref(),
        }
        .build(&ledger)?;
        let mut lock = stdout().lock();
        TextRenderer::new(table, Some(2)).render(&mut lock)?;
        lock.flush()?;
        Ok(())
    }
}

#[derive(Args)]
#[group(multiple = false)]
struct PeriodArgs {
    #[arg(short, long)]
    daily: bool,
    #[arg(short, long)]
    monthly: bool,
    #[arg(short, long)]
    yearly: bool,
}

impl PeriodArgs {
    fn to_interval(&self) -> Interval {
        if self.daily {
            Interval::Daily
        } else if self.yearly {
            Interval::Yearly
        } else {
            Interval::Monthly
        }
    }
}
