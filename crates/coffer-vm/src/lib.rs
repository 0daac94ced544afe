//! Coffer VM - in-process execution client for application contracts.
//!
//! This crate provides:
//! - `Client`: submit contracts, call them as a signer, read raw state
//! - `Contract`: the trait contract code implements
//! - `Env`: the calling convention seen by a running contract
//!   (`ctx`, keyed state, cross-contract calls, events)
//! - Call depth tracking and all-or-nothing transactions

pub mod call_stack;
pub mod client;
pub mod context;
pub mod contract;
pub mod env;
pub mod error;
pub mod kwargs;
pub mod receipt;

pub use call_stack::{CallFrame, CallStack};
pub use client::{Client, ClientConfig, ContractHandle};
pub use context::{Call, Context};
pub use contract::Contract;
pub use env::Env;
pub use error::{VmError, VmResult};
pub use kwargs::Kwargs;
pub use receipt::{Event, Receipt};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Maximum nested contract call depth
pub const MAX_CALL_DEPTH: usize = 64;

/// Signer used when a call does not name one
pub const DEFAULT_SIGNER: &str = coffer_types::AccountId::SYS;

/// Variable written for every submitted contract
pub const SUBMITTED_MARKER: &str = "__submitted__";

/// Fail the current call with an assertion error unless `cond` holds.
///
/// ```rust,ignore
/// require!(balance >= amount, "insufficient funds");
/// ```
#[macro_export]
macro_rules! require {
    ($cond:expr, $msg:expr $(,)?) => {
        if !$cond {
            return Err($crate::VmError::Assertion(($msg).to_string()));
        }
    };
}

/// Build [`Kwargs`] from `name: value` pairs; values go through `json!`.
///
/// ```rust,ignore
/// let args = kwargs! { amount: 200, to: "con_safe" };
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::Kwargs::new()
    };
    ($($name:ident : $value:expr),+ $(,)?) => {{
        let mut kwargs = $crate::Kwargs::new();
        $( kwargs.insert(stringify!($name), $crate::__private::serde_json::json!($value)); )+
        kwargs
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guarded(ok: bool) -> VmResult<()> {
        require!(ok, "insufficient funds");
        Ok(())
    }

    #[test]
    fn test_require_macro() {
        assert!(guarded(true).is_ok());
        assert_eq!(
            guarded(false),
            Err(VmError::Assertion("insufficient funds".to_string()))
        );
    }

    #[test]
    fn test_kwargs_macro() {
        let args = kwargs! { amount: 200, to: "con_safe" };
        assert_eq!(args.len(), 2);
        assert!(kwargs!().is_empty());
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_CALL_DEPTH, 64);
        assert_eq!(DEFAULT_SIGNER, "sys");
    }
}
