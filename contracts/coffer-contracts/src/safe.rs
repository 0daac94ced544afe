//! Safe Contract
//!
//! Users deposit currency into the safe and withdraw it later. Deposits
//! pull funds with `transfer_from`, so the depositor must first approve
//! the safe on the currency contract.

use coffer_types::{AccountId, Amount};
use coffer_vm::{kwargs, require, Contract, Env, Kwargs, VmError, VmResult};
use serde::Serialize;
use serde_json::Value;

/// Deposits hash: account -> amount held
pub const SAFE: &str = "safe";

/// Name of the imported currency contract, recorded at construction
pub const CURRENCY: &str = "currency";

/// Safe contract code, bound to the currency it imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Safe {
    currency: String,
}

/// Deposit and withdraw events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafeEvent {
    pub account: AccountId,
    pub amount: Amount,
}

impl Safe {
    /// Name the safe is conventionally submitted under
    pub const NAME: &'static str = "con_safe";

    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Currency contract this safe moves funds on
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Currency recorded when the safe was constructed. It wins over the
    /// name this code was attached with.
    pub fn imported_currency(&self, env: &Env<'_>) -> VmResult<String> {
        let recorded: Option<String> = env.get(CURRENCY, &[])?;
        Ok(recorded.unwrap_or_else(|| self.currency.clone()))
    }

    /// Amount held for `account`
    pub fn get_balance(env: &Env<'_>, account: &AccountId) -> VmResult<Amount> {
        env.get(SAFE, &[account.as_str()])
    }

    /// Pull `amount` from the caller into the safe
    pub fn deposit(&self, env: &mut Env<'_>, amount: Amount) -> VmResult<()> {
        let caller = env.ctx().caller.clone();
        let this = env.ctx().this.clone();
        let currency = self.imported_currency(env)?;

        env.call(
            &currency,
            "transfer_from",
            kwargs! { amount: amount, to: this, main_account: caller },
        )?;

        let held = Self::get_balance(env, &caller)?;
        env.set(SAFE, &[caller.as_str()], &held.try_add(&amount)?)?;
        emit(env, "Deposit", caller, amount)
    }

    /// Send `amount` of the caller's deposit back to the caller
    pub fn withdraw(&self, env: &mut Env<'_>, amount: Amount) -> VmResult<()> {
        let caller = env.ctx().caller.clone();
        let held = Self::get_balance(env, &caller)?;
        require!(held >= amount, "insufficient funds");

        let currency = self.imported_currency(env)?;
        env.call(
            &currency,
            "transfer",
            kwargs! { amount: amount, to: caller },
        )?;

        env.set(SAFE, &[caller.as_str()], &held.try_sub(&amount)?)?;
        emit(env, "Withdraw", caller, amount)
    }
}

impl Default for Safe {
    fn default() -> Self {
        Self::new(crate::CurrencyStub::NAME)
    }
}

fn emit(env: &mut Env<'_>, event: &str, account: AccountId, amount: Amount) -> VmResult<()> {
    let data = serde_json::to_value(SafeEvent { account, amount })
        .map_err(|e| VmError::InvalidValue(e.to_string()))?;
    env.emit(event, data);
    Ok(())
}

impl Contract for Safe {
    fn exports(&self) -> &'static [&'static str] {
        &["deposit", "withdraw", "get_balance"]
    }

    fn construct(&self, env: &mut Env<'_>) -> VmResult<()> {
        AccountId::validate(&self.currency)?;
        env.set(CURRENCY, &[], &self.currency)
    }

    fn call(&self, env: &mut Env<'_>, function: &str, kwargs: &Kwargs) -> VmResult<Value> {
        match function {
            "deposit" => {
                kwargs.expect_only(&["amount"])?;
                self.deposit(env, kwargs.required("amount")?)?;
                Ok(Value::Null)
            }
            "withdraw" => {
                kwargs.expect_only(&["amount"])?;
                self.withdraw(env, kwargs.required("amount")?)?;
                Ok(Value::Null)
            }
            "get_balance" => {
                kwargs.expect_only(&["account"])?;
                let held = Self::get_balance(env, &kwargs.required("account")?)?;
                Ok(Value::String(held.to_string()))
            }
            other => unreachable!("{} is not exported", other),
        }
    }
}
