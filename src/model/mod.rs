//! Types that represent the core data model, such as `Transaction` and `Category`.
mod amount;
mod category;
mod transaction;

pub use amount::{format_currency, Amount, AmountError, CURRENCY_SYMBOL};
pub use category::{Category, TransactionType};
pub use transaction::{Transaction, TransactionId};
