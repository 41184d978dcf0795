use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{Accounts, ModelError};

pub mod balance;
pub mod period;
pub mod register;
pub mod table;

/// Sums `values` converted to `target` at the current market rates.
pub fn valuate<'a, I>(accounts: &Accounts, values: I, target: &str) -> Result<Decimal, ModelError>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    values.into_iter().try_fold(Decimal::ZERO, |sum, (c, v)| {
        v.checked_mul(accounts.market_price(c, target)?)
            .and_then(|v| sum.checked_add(v))
            .ok_or_else(|| ModelError::overflow(format!("value of {}{} in {}", c, v, target)))
    })
}

fn accumulate(sums: &mut BTreeMap<String, Decimal>, currency: &str, v: Decimal) -> Result<(), ModelError> {
    let sum = sums.entry(currency.to_string()).or_default();
    *sum = sum
        .checked_add(v)
        .ok_or_else(|| ModelError::overflow(format!("total of {}", currency)))?;
    Ok(())
}
