use rust_decimal::Decimal;

use super::error::ModelError;
use super::expr::{evaluate, parse_decimal};

type Result<T> = std::result::Result<T, ModelError>;

/// Characters that can make up the numeric part of an amount token.
fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')' | '*' | '+' | '/' | ' ')
}

/// The first run of non-numeric characters in the token, if any.
pub fn currency_symbol(token: &str) -> Option<&str> {
    let token = token.trim();
    let start = token.find(|c| !is_numeric(c))?;
    let rest = &token[start..];
    let end = rest.find(is_numeric).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// The token with every non-numeric character removed.
pub fn strip_currency(token: &str) -> String {
    token
        .chars()
        .filter(|c| is_numeric(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn number(token: &str) -> Result<Decimal> {
    let s = strip_currency(token);
    if s.contains('(') {
        evaluate(&s)
    } else {
        parse_decimal(&s)
    }
}

fn single(token: &str) -> Result<(String, Decimal)> {
    Ok((
        currency_symbol(token).unwrap_or_default().to_string(),
        number(token)?,
    ))
}

/// A market rate implied by a price annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rate {
    pub commodity: String,
    pub target: String,
    pub rate: Decimal,
}

/// The parsed form of one amount token. `values` keeps the order in which
/// currencies appear in the token; a currency occurs at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Amount {
    pub values: Vec<(String, Decimal)>,
    pub assertion: Option<(String, Decimal)>,
    pub rate: Option<Rate>,
}

impl Amount {
    pub fn parse(token: &str) -> Result<Amount> {
        let token = token.trim();
        let mut amount = Amount::default();
        if token.is_empty() {
            return Ok(amount);
        }
        match token.split_once('=') {
            Some((value, assertion)) => {
                amount.assertion = Some(single(assertion)?);
                if !value.trim().is_empty() {
                    amount.parse_value(value.trim())?;
                }
            }
            None => amount.parse_value(token)?,
        }
        Ok(amount)
    }

    fn parse_value(&mut self, token: &str) -> Result<()> {
        if let Some((quantity, total)) = token.split_once("@@") {
            let (commodity, q) = single(quantity)?;
            let (target, t) = single(total)?;
            if q.is_zero() {
                return Err(ModelError::InvalidAmount(format!("zero quantity in {:?}", token)));
            }
            let counter = if q.is_sign_negative() { t.abs() } else { -t.abs() };
            let rate = t
                .abs()
                .checked_div(q.abs())
                .ok_or_else(|| ModelError::InvalidAmount(format!("overflow in {:?}", token)))?;
            self.set(&commodity, q)?;
            self.set(&target, counter)?;
            self.rate = Some(Rate {
                commodity,
                target,
                rate,
            });
        } else if let Some((quantity, price)) = token.split_once('@') {
            let (commodity, q) = single(quantity)?;
            let (target, p) = single(price)?;
            let total = q
                .checked_mul(p)
                .ok_or_else(|| ModelError::InvalidAmount(format!("overflow in {:?}", token)))?;
            self.set(&commodity, q)?;
            self.set(&target, -total)?;
            self.rate = Some(Rate {
                commodity,
                target,
                rate: p,
            });
        } else {
            let (currency, value) = single(token)?;
            self.set(&currency, value)?;
        }
        Ok(())
    }

    fn set(&mut self, currency: &str, value: Decimal) -> Result<()> {
        if self.values.iter().any(|(c, _)| c == currency) {
            return Err(ModelError::InvalidAmount(format!(
                "currency {:?} given twice",
                currency
            )));
        }
        self.values.push((currency.to_string(), value));
        Ok(())
    }

    /// True if the token left the value to be inferred.
    pub fn is_inferred(&self) -> bool {
        self.values.is_empty() && self.assertion.is_none()
    }
}
