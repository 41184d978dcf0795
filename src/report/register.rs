use chrono::NaiveDate;
use regex::Regex;

use crate::model::transaction::DATE_FORMAT;
use crate::model::Ledger;

use super::table::{Cell, Row, Table};

/// One row per matching item and currency: date, title, account, the
/// item's value and the account balance after the transaction.
pub fn register(ledger: &Ledger, filters: &[Regex], start: Option<NaiveDate>) -> Table {
    let accounts = &ledger.accounts;
    let mut table = Table::default();
    for t in ledger.transactions_from(start) {
        for item in t.items() {
            if !accounts.matches(item.account, filters) {
                continue;
            }
            for c in item.currencies() {
                table.add_row(
                    Row::new()
                        .with(Cell::left(t.date.format(DATE_FORMAT).to_string()))
                        .with(Cell::left(t.title.clone()))
                        .with(Cell::left(accounts.name(item.account)))
                        .with(Cell::decimal(item.value(c)))
                        .with(Cell::decimal(item.post_value(c).unwrap_or_default()))
                        .with(Cell::left(c)),
                );
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_register() {
        let text = [
            "2000/01/01 salary",
            "  Assets:Bank  $100",
            "  Income",
            "2000/01/02 groceries",
            "  Expenses:Food  $30",
            "  Assets:Bank",
            "2000/01/03 check",
            "  Assets:Bank  =$70",
            "  Equity",
        ];
        let ledger = parse(text, None, &Default::default()).unwrap();
        let filters = [Regex::new("Assets").unwrap()];
        let table = register(&ledger, &filters, None);
        let values: Vec<_> = table
            .rows
            .iter()
            .map(|row| match row {
                Row::Row { cells } => (cells[3].clone_decimal(), cells[4].clone_decimal()),
                Row::Separator => unreachable!(),
            })
            .collect();
        assert_eq!(
            values,
            vec![
                (dec!(100), dec!(100)),
                (dec!(-30), dec!(70)),
                (dec!(0), dec!(70)),
            ]
        );

        let start = NaiveDate::from_ymd_opt(2000, 1, 2);
        assert_eq!(register(&ledger, &filters, start).rows.len(), 2);
    }

    impl Cell {
        fn clone_decimal(&self) -> rust_decimal::Decimal {
            match self {
                Cell::Decimal { value } => *value,
                _ => panic!("not a decimal: {:?}", self),
            }
        }
    }
}
