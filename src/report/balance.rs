use std::collections::BTreeMap;

use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{AccountId, Accounts, ModelError};

use super::table::{Cell, Row, Table};
use super::{accumulate, valuate};

/// Account balances in tree order, followed by a total row per currency.
/// `depth` is the number of levels shown.
pub struct BalanceReport<'a> {
    pub filters: &'a [Regex],
    pub depth: Option<usize>,
    pub market: Option<&'a str>,
}

impl BalanceReport<'_> {
    pub fn build(&self, accounts: &Accounts) -> Result<Table, ModelError> {
        let mut table = Table::default();
        let matched: Vec<AccountId> = accounts
            .descendants(accounts.root())
            .into_iter()
            .filter(|a| accounts.matches(*a, self.filters))
            .collect();

        for &account in &matched {
            let depth = accounts.depth(account);
            if self.depth.is_some_and(|d| depth >= d) {
                continue;
            }
            let mut name = Some(Cell::indented(accounts.segment(account), 2 * depth));
            for (currency, value) in self.rows(accounts, account)? {
                table.add_row(
                    Row::new()
                        .with(Cell::decimal(value))
                        .with(Cell::left(currency))
                        .with(name.take().unwrap_or(Cell::Empty)),
                );
            }
        }

        table.add_separator();
        for (currency, value) in self.total(accounts, &matched)? {
            table.add_row(
                Row::new()
                    .with(Cell::decimal(value))
                    .with(Cell::left(currency)),
            );
        }
        Ok(table)
    }

    fn rows(&self, accounts: &Accounts, account: AccountId) -> Result<Vec<(String, Decimal)>, ModelError> {
        let values = accounts
            .currencies(account)
            .into_iter()
            .map(|c| Ok((accounts.value(account, &c)?, c)))
            .collect::<Result<Vec<_>, ModelError>>()?;
        let res = match self.market {
            Some(m) => {
                let total = valuate(accounts, values.iter().map(|(v, c)| (c.as_str(), *v)), m)?;
                vec![(m.to_string(), total)]
            }
            None => values.into_iter().map(|(v, c)| (c, v)).collect(),
        };
        Ok(res.into_iter().filter(|(_, v)| !v.is_zero()).collect())
    }

    /// Sums the accounts' own balances, so that nested matches are counted
    /// once.
    fn total(&self, accounts: &Accounts, matched: &[AccountId]) -> Result<BTreeMap<String, Decimal>, ModelError> {
        let mut res = BTreeMap::<String, Decimal>::new();
        for &account in matched {
            for c in accounts.currencies(account) {
                accumulate(&mut res, &c, accounts.specific_value(account, &c))?;
            }
        }
        match self.market {
            Some(m) => {
                let total = valuate(accounts, res.iter().map(|(c, v)| (c.as_str(), *v)), m)?;
                Ok(BTreeMap::from([(m.to_string(), total)]))
            }
            None => Ok(res),
        }
    }
}
