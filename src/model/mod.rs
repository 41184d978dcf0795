pub mod account;
pub mod amount;
pub mod auto;
pub mod error;
pub mod expr;
pub mod ledger;
pub mod periodic;
pub mod prices;
pub mod transaction;

pub use account::{AccountId, Accounts};
pub use error::ModelError;
pub use ledger::Ledger;
pub use transaction::{Transaction, TransactionItem};
