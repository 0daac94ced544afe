//! Coffer Types - Core type definitions shared by the Coffer crates.
//!
//! This crate provides:
//! - Account identifiers (signer and contract names)
//! - Amounts (non-negative fixed-point token quantities)

pub mod account;
pub mod amount;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use account::AccountId;
pub use amount::Amount;
pub use error::TypesError;
