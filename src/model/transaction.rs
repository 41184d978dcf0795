use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::account::{AccountId, Accounts};
use super::amount::Amount;
use super::error::ModelError;

type Result<T> = std::result::Result<T, ModelError>;

pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Absolute tolerance for balance checks and assertions.
pub fn tolerance() -> Decimal {
    Decimal::new(1, 6)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionItem {
    pub account: AccountId,
    pub assertion: Option<(String, Decimal)>,
    pub line: Option<usize>,
    values: Vec<(String, Decimal)>,
    post_values: BTreeMap<String, Decimal>,
}

impl TransactionItem {
    pub fn new(account: AccountId, amount: Amount, line: Option<usize>) -> Self {
        TransactionItem {
            account,
            assertion: amount.assertion,
            line,
            values: amount.values,
            post_values: BTreeMap::new(),
        }
    }

    pub fn with_value(account: AccountId, currency: &str, value: Decimal, line: Option<usize>) -> Self {
        TransactionItem {
            account,
            assertion: None,
            line,
            values: vec![(currency.to_string(), value)],
            post_values: BTreeMap::new(),
        }
    }

    pub fn values(&self) -> &[(String, Decimal)] {
        &self.values
    }

    pub fn value(&self, currency: &str) -> Decimal {
        self.values
            .iter()
            .find(|(c, _)| c == currency)
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }

    fn set_value(&mut self, currency: &str, value: Decimal) -> Result<()> {
        if self.values.iter().any(|(c, _)| c == currency) {
            return Err(ModelError::InvalidAmount(format!(
                "value for {:?} is already set",
                currency
            )));
        }
        let value = if value.is_zero() { Decimal::ZERO } else { value };
        self.values.push((currency.to_string(), value));
        Ok(())
    }

    /// The account's balance right after this item was committed.
    pub fn post_value(&self, currency: &str) -> Option<Decimal> {
        self.post_values.get(currency).copied()
    }

    /// Currencies of the values followed by the assertion's currency.
    pub fn currencies(&self) -> Vec<&str> {
        let mut res: Vec<&str> = self.values.iter().map(|(c, _)| c.as_str()).collect();
        if let Some((c, _)) = &self.assertion {
            if !res.contains(&c.as_str()) {
                res.push(c);
            }
        }
        res
    }

    pub fn is_missing_value(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_inferred(&self) -> bool {
        self.is_missing_value() && self.assertion.is_none()
    }

    /// Items carrying two currencies are price conversions and balance
    /// themselves.
    pub fn is_conversion(&self) -> bool {
        self.values.len() > 1
    }

    pub fn describe(&self, accounts: &Accounts) -> String {
        let mut s = match self.line {
            Some(line) => format!("#{} {}", line, accounts.name(self.account)),
            None => accounts.name(self.account),
        };
        for (c, v) in &self.values {
            s.push_str(&format!(" {}{}", c, v));
        }
        if let Some((c, v)) = &self.assertion {
            s.push_str(&format!(" ={}{}", c, v));
        }
        s
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub title: String,
    pub initialize: bool,
    pub line: Option<usize>,
    items: Vec<TransactionItem>,
    inferred: Option<usize>,
}

impl Transaction {
    pub fn new(date: NaiveDate, title: &str, line: Option<usize>) -> Self {
        let title = title.trim();
        Transaction {
            date,
            title: title.to_string(),
            initialize: title.starts_with('*'),
            line,
            items: Vec::new(),
            inferred: None,
        }
    }

    pub fn items(&self) -> &[TransactionItem] {
        &self.items
    }

    pub fn inferred_item(&self) -> Option<&TransactionItem> {
        self.inferred.map(|i| &self.items[i])
    }

    /// Parses `token` for the account at `path` and appends the item. Price
    /// annotations are recorded as market rates right away.
    pub fn add_item(
        &mut self,
        accounts: &mut Accounts,
        path: &str,
        token: &str,
        line: Option<usize>,
    ) -> Result<usize> {
        let amount = Amount::parse(token)?;
        let account = accounts.account(path);
        if let Some(rate) = &amount.rate {
            accounts.set_market_price(&rate.commodity, &rate.target, rate.rate);
        }
        self.push(TransactionItem::new(account, amount, line))
    }

    pub fn push(&mut self, item: TransactionItem) -> Result<usize> {
        let index = self.items.len();
        if item.is_inferred() {
            if self.inferred.is_some() {
                return Err(ModelError::MultipleInferredItems {
                    line: item.line.or(self.line).unwrap_or_default(),
                });
            }
            self.inferred = Some(index);
        }
        self.items.push(item);
        Ok(index)
    }

    pub fn header(&self) -> String {
        let date = self.date.format(DATE_FORMAT);
        match self.line {
            Some(line) => format!("#{} {} {}", line, date, self.title),
            None => format!("{} {}", date, self.title),
        }
    }

    /// The first `index + 1` components of the date: year, month, day.
    pub fn date_identifier(&self, index: usize) -> String {
        self.date
            .format(DATE_FORMAT)
            .to_string()
            .split('/')
            .take(index + 1)
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn dump(&self, accounts: &Accounts) -> String {
        let mut s = format!("{} ({} items)", self.header(), self.items.len());
        let inferred = self.inferred_item();
        for item in &self.items {
            s.push('\n');
            s.push_str(&item.describe(accounts));
            if inferred.is_some_and(|i| std::ptr::eq(i, item)) {
                s.push_str(" (inferred)");
            }
        }
        s
    }

    /// Balances the transaction and applies it to `accounts`. Nothing is
    /// applied if the transaction does not balance; a failing assertion is
    /// reported after the values have been applied.
    pub fn commit(&mut self, accounts: &mut Accounts) -> Result<()> {
        tracing::debug!("committing {}", self.header());
        let currencies: BTreeSet<String> = self
            .items
            .iter()
            .flat_map(|i| i.currencies())
            .map(str::to_string)
            .collect();

        for item in &mut self.items {
            if !item.is_missing_value() {
                continue;
            }
            if let Some((c, expected)) = item.assertion.clone() {
                let current = accounts.value(item.account, &c)?;
                let delta = expected
                    .checked_sub(current)
                    .ok_or_else(|| ModelError::overflow(item.describe(accounts)))?;
                item.set_value(&c, delta)?;
            }
        }

        if !self.initialize {
            for c in &currencies {
                let sum = self
                    .items
                    .iter()
                    .filter(|i| !i.is_conversion())
                    .try_fold(Decimal::ZERO, |sum, i| sum.checked_add(i.value(c)))
                    .ok_or_else(|| ModelError::overflow(format!("sum of {} in {}", c, self.header())))?;
                match self.inferred {
                    Some(i) => self.items[i].set_value(c, -sum)?,
                    None if sum.abs() > tolerance() => {
                        tracing::error!(
                            "transaction doesn't balance {} {:?} {:?}",
                            sum,
                            c,
                            self.items.iter().map(|i| i.value(c)).collect::<Vec<_>>()
                        );
                        return Err(ModelError::UnbalancedTransaction {
                            currency: c.clone(),
                            sum,
                        });
                    }
                    None => (),
                }
            }
        }

        for c in &currencies {
            for item in &mut self.items {
                accounts.add_value(item.account, c, item.value(c), self.initialize)?;
                item.post_values
                    .insert(c.clone(), accounts.value(item.account, c)?);
            }
            for item in &self.items {
                let Some((ac, expected)) = &item.assertion else {
                    continue;
                };
                if ac != c {
                    continue;
                }
                let actual = accounts.value(item.account, c)?;
                let diff = actual
                    .checked_sub(*expected)
                    .ok_or_else(|| ModelError::overflow(item.describe(accounts)))?;
                if diff.abs() > tolerance() {
                    return Err(ModelError::BalanceAssertionFailed {
                        account: accounts.name(item.account),
                        currency: c.clone(),
                        expected: *expected,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }
}
