use chrono::NaiveDate;

use super::account::Accounts;
use super::transaction::Transaction;

/// The result of parsing a journal: the committed account tree and every
/// transaction in commit order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub accounts: Accounts,
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).min()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).max()
    }

    /// Transactions dated on or after `start`, all of them if `start` is
    /// `None`.
    pub fn transactions_from(&self, start: Option<NaiveDate>) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| start.map_or(true, |s| t.date >= s))
    }
}
