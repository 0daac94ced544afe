use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Empty account name")]
    EmptyAccount,

    #[error("Account name too long: max {max}, got {actual}")]
    AccountTooLong { max: usize, actual: usize },

    #[error("Invalid character {ch:?} in account name {name:?}")]
    InvalidAccountChar { name: String, ch: char },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount has more than {max} fractional digits: {value}")]
    AmountPrecision { value: String, max: u32 },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Amount underflow")]
    AmountUnderflow,
}
