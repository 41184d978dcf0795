use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::model::periodic::Interval;
use crate::model::{Ledger, ModelError};

use super::table::{Cell, Row, Table};
use super::{accumulate, valuate};

/// Sums of matching items grouped by a date prefix.
pub struct PeriodReport<'a> {
    pub filters: &'a [Regex],
    pub interval: Interval,
    pub start: Option<NaiveDate>,
    pub market: Option<&'a str>,
}

fn date_index(interval: Interval) -> usize {
    match interval {
        Interval::Yearly => 0,
        Interval::Monthly => 1,
        Interval::Daily => 2,
    }
}

impl PeriodReport<'_> {
    pub fn sums(&self, ledger: &Ledger) -> Result<BTreeMap<String, BTreeMap<String, Decimal>>, ModelError> {
        let accounts = &ledger.accounts;
        let mut res = BTreeMap::<String, BTreeMap<String, Decimal>>::new();
        for t in ledger.transactions_from(self.start) {
            let group = res.entry(t.date_identifier(date_index(self.interval))).or_default();
            for item in t.items() {
                if !accounts.matches(item.account, self.filters) {
                    continue;
                }
                let values = item.values().iter().map(|(c, v)| (c.as_str(), *v));
                match self.market {
                    Some(m) => accumulate(group, m, valuate(accounts, values, m)?)?,
                    None => {
                        for (c, v) in values {
                            accumulate(group, c, v)?;
                        }
                    }
                }
            }
        }
        res.retain(|_, sums| !sums.is_empty());
        Ok(res)
    }

    pub fn build(&self, ledger: &Ledger) -> Result<Table, ModelError> {
        let mut table = Table::default();
        for (group, sums) in self.sums(ledger)? {
            let mut label = Some(Cell::left(group));
            for (currency, value) in sums {
                table.add_row(
                    Row::new()
                        .with(label.take().unwrap_or(Cell::Empty))
                        .with(Cell::decimal(value))
                        .with(Cell::left(currency)),
                );
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const JOURNAL: &str = "
2000/01/05 groceries
  Expenses:Food  $10
  Assets
2000/01/20 groceries
  Expenses:Food  EUR 5
  Assets
2000/02/01 rent
  Expenses:Rent  $500
  Assets
P 2000/02/01 EUR $2
";

    fn sums(interval: Interval, market: Option<&str>) -> Vec<(String, Vec<(String, Decimal)>)> {
        let ledger = parse(JOURNAL.lines(), None, &Default::default()).unwrap();
        let filters = [Regex::new("Expenses").unwrap()];
        PeriodReport {
            filters: &filters,
            interval,
            start: None,
            market,
        }
        .sums(&ledger)
        .unwrap()
        .into_iter()
        .map(|(g, s)| (g, s.into_iter().collect()))
        .collect()
    }

    #[test]
    fn test_monthly() {
        assert_eq!(
            sums(Interval::Monthly, None),
            vec![
                (
                    "2000/01".to_string(),
                    vec![("$".to_string(), dec!(10)), ("EUR".to_string(), dec!(5))]
                ),
                ("2000/02".to_string(), vec![("$".to_string(), dec!(500))]),
            ]
        );
    }

    #[test]
    fn test_yearly_market() {
        assert_eq!(
            sums(Interval::Yearly, Some("$")),
            vec![("2000".to_string(), vec![("$".to_string(), dec!(520))])]
        );
    }

    #[test]
    fn test_daily() {
        let groups: Vec<String> = sums(Interval::Daily, None).into_iter().map(|(g, _)| g).collect();
        assert_eq!(groups, vec!["2000/01/05", "2000/01/20", "2000/02/01"]);
    }
}
