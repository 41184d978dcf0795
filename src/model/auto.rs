use regex::Regex;
use rust_decimal::Decimal;

use super::account::Accounts;
use super::amount::Amount;
use super::error::ModelError;
use super::transaction::{Transaction, TransactionItem};

type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
struct Template {
    account: String,
    currency: String,
    value: Decimal,
    line: Option<usize>,
}

/// A rule adding postings to every transaction that touches an account
/// matching `pattern`. A template without a currency is a factor applied to
/// the triggering item's value.
#[derive(Debug, Clone)]
pub struct AutoTransaction {
    pattern: Regex,
    templates: Vec<Template>,
}

impl AutoTransaction {
    pub fn new(pattern: Regex) -> Self {
        AutoTransaction {
            pattern,
            templates: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn add_template(&mut self, account: &str, token: &str, line: Option<usize>) -> Result<()> {
        let amount = Amount::parse(token)?;
        match amount.values.as_slice() {
            [(currency, value)] => {
                self.templates.push(Template {
                    account: account.to_string(),
                    currency: currency.clone(),
                    value: *value,
                    line,
                });
                Ok(())
            }
            _ => Err(ModelError::InvalidTemplate(format!(
                "{} {:?} must have exactly one currency",
                account, token
            ))),
        }
    }

    pub fn matches(&self, account: &str) -> bool {
        self.pattern
            .find(account)
            .is_some_and(|m| m.start() == 0)
    }

    /// Appends the rule's postings for `transaction.items()[trigger]`. Items
    /// without an explicit value trigger nothing.
    pub fn apply(
        &self,
        transaction: &mut Transaction,
        accounts: &mut Accounts,
        trigger: usize,
    ) -> Result<()> {
        let Some((ref_currency, ref_value)) = transaction.items()[trigger].values().first().cloned()
        else {
            return Ok(());
        };
        for t in &self.templates {
            let (currency, value) = if t.currency.is_empty() {
                let value = t.value.checked_mul(ref_value).ok_or_else(|| {
                    ModelError::InvalidAmount(format!("overflow scaling {} by {}", ref_value, t.value))
                })?;
                (ref_currency.as_str(), value)
            } else {
                (t.currency.as_str(), t.value)
            };
            let account = accounts.account(&t.account);
            transaction.push(TransactionItem::with_value(account, currency, value, t.line))?;
        }
        Ok(())
    }
}
