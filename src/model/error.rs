use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ModelError {
    #[error("transaction does not balance: {sum} {currency:?} left over")]
    UnbalancedTransaction { currency: String, sum: Decimal },

    #[error("balance assertion failed for {account}: expected {expected} {currency:?}, got {actual}")]
    BalanceAssertionFailed {
        account: String,
        currency: String,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("more than one item without a value (line {line})")]
    MultipleInferredItems { line: usize },

    #[error("no market rate from {commodity:?} to {target:?}")]
    RateNotFound { commodity: String, target: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid automatic posting template: {0}")]
    InvalidTemplate(String),
}

impl ModelError {
    pub(crate) fn overflow(what: impl std::fmt::Display) -> Self {
        ModelError::InvalidAmount(format!("overflow in {}", what))
    }
}
