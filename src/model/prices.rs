use std::collections::HashMap;

use rust_decimal::Decimal;

use super::error::ModelError;

/// Market rates between currencies, as recorded by `@`/`@@` annotations and
/// `P` directives. The latest recording for a pair wins.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Prices {
    prices: HashMap<String, HashMap<String, Decimal>>,
}

impl Prices {
    pub fn insert(&mut self, commodity: &str, target: &str, rate: Decimal) {
        tracing::trace!("market rate {} -> {} = {}", commodity, target, rate);
        self.prices
            .entry(commodity.to_string())
            .or_default()
            .insert(target.to_string(), rate);
    }

    /// Price of one unit of `commodity` expressed in `target`. A rate recorded
    /// in the opposite direction is inverted when no direct one exists.
    pub fn rate(&self, commodity: &str, target: &str) -> Result<Decimal, ModelError> {
        if commodity == target {
            return Ok(Decimal::ONE);
        }
        if let Some(rate) = self.prices.get(commodity).and_then(|m| m.get(target)) {
            return Ok(*rate);
        }
        self.prices
            .get(target)
            .and_then(|m| m.get(commodity))
            .and_then(|rate| Decimal::ONE.checked_div(*rate))
            .ok_or_else(|| ModelError::RateNotFound {
                commodity: commodity.to_string(),
                target: target.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
