//! Coffer Contracts
//!
//! Two application contracts for the Coffer execution client:
//! - [`CurrencyStub`]: balances plus approve/transfer_from allowances
//! - [`Safe`]: a vault holding currency deposited by its users

pub mod currency;
pub mod safe;

pub use currency::{ApprovalEvent, CurrencyStub, MintEvent, TransferEvent};
pub use safe::{Safe, SafeEvent};

use coffer_vm::{Client, VmResult};

/// Contract version
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Submit the currency stub as `currency` and a safe importing it as `safe`.
pub fn install(client: &Client, currency: &str, safe: &str) -> VmResult<()> {
    client.submit(currency, CurrencyStub)?;
    client.submit(safe, Safe::new(currency))?;
    Ok(())
}

/// [`install`] under the conventional names `currency` and `con_safe`.
pub fn install_default(client: &Client) -> VmResult<()> {
    install(client, CurrencyStub::NAME, Safe::NAME)
}
