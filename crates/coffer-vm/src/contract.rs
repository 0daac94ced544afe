//! The trait contract code implements.

use crate::env::Env;
use crate::error::VmResult;
use crate::kwargs::Kwargs;
use serde_json::Value;

/// Application contract loaded into a [`Client`](crate::Client).
///
/// A contract is stateless Rust code; everything it remembers lives in the
/// client's keyed state and is reached through [`Env`].
pub trait Contract: Send + Sync {
    /// Functions callable by signers and other contracts.
    fn exports(&self) -> &'static [&'static str];

    /// Runs once when the contract is submitted, as the submitting signer.
    fn construct(&self, _env: &mut Env<'_>) -> VmResult<()> {
        Ok(())
    }

    /// Dispatch an exported function. Only names in [`Contract::exports`]
    /// ever reach this method.
    fn call(&self, env: &mut Env<'_>, function: &str, kwargs: &Kwargs) -> VmResult<Value>;
}
