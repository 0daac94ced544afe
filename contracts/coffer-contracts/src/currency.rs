//! Currency Stub Contract
//!
//! Minimal token used as the network currency in local runs and tests.
//!
//! Features:
//! - Unrestricted minting (it is a stub)
//! - Transfers between accounts
//! - Allowances: `approve` then `transfer_from` by the approved spender

use coffer_types::{AccountId, Amount};
use coffer_vm::{require, Contract, Env, Kwargs, VmResult};
use serde::Serialize;
use serde_json::Value;

/// Balances hash: account -> amount
pub const BALANCES: &str = "balances";

/// Allowances hash: (owner, spender) -> amount
pub const APPROVALS: &str = "approvals";

/// Currency stub contract code. All state lives in the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyStub;

/// Mint Event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintEvent {
    pub to: AccountId,
    pub amount: Amount,
}

/// Transfer Event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEvent {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Approval Event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalEvent {
    pub owner: AccountId,
    pub spender: AccountId,
    pub amount: Amount,
}

impl CurrencyStub {
    /// Name the currency is conventionally submitted under
    pub const NAME: &'static str = "currency";

    /// Get balance of account
    pub fn balance_of(env: &Env<'_>, account: &AccountId) -> VmResult<Amount> {
        env.get(BALANCES, &[account.as_str()])
    }

    /// Get allowance granted by `owner` to `spender`
    pub fn allowance(env: &Env<'_>, owner: &AccountId, spender: &AccountId) -> VmResult<Amount> {
        env.get(APPROVALS, &[owner.as_str(), spender.as_str()])
    }

    /// Credit `amount` to `to`
    pub fn mint(env: &mut Env<'_>, amount: Amount, to: &AccountId) -> VmResult<()> {
        Self::credit(env, to, amount)?;
        emit(env, "Mint", &MintEvent { to: to.clone(), amount })
    }

    /// Set the caller's allowance for `to`, replacing any previous one
    pub fn approve(env: &mut Env<'_>, amount: Amount, to: &AccountId) -> VmResult<()> {
        let owner = env.ctx().caller.clone();
        env.set(APPROVALS, &[owner.as_str(), to.as_str()], &amount)?;
        emit(
            env,
            "Approve",
            &ApprovalEvent {
                owner,
                spender: to.clone(),
                amount,
            },
        )
    }

    /// Move `amount` from the caller to `to`
    pub fn transfer(env: &mut Env<'_>, amount: Amount, to: &AccountId) -> VmResult<()> {
        let from = env.ctx().caller.clone();
        require!(Self::balance_of(env, &from)? >= amount, "insufficient funds");
        Self::move_funds(env, &from, to, amount)
    }

    /// Move `amount` from `main_account` to `to` using the caller's allowance
    pub fn transfer_from(
        env: &mut Env<'_>,
        amount: Amount,
        to: &AccountId,
        main_account: &AccountId,
    ) -> VmResult<()> {
        let spender = env.ctx().caller.clone();
        let allowed = Self::allowance(env, main_account, &spender)?;
        require!(allowed >= amount, "not approved");
        require!(
            Self::balance_of(env, main_account)? >= amount,
            "insufficient funds"
        );

        env.set(
            APPROVALS,
            &[main_account.as_str(), spender.as_str()],
            &allowed.try_sub(&amount)?,
        )?;
        Self::move_funds(env, main_account, to, amount)
    }

    fn move_funds(env: &mut Env<'_>, from: &AccountId, to: &AccountId, amount: Amount) -> VmResult<()> {
        let from_balance = Self::balance_of(env, from)?;
        env.set(BALANCES, &[from.as_str()], &from_balance.try_sub(&amount)?)?;
        // Re-read: `to` may be `from`
        Self::credit(env, to, amount)?;
        emit(
            env,
            "Transfer",
            &TransferEvent {
                from: from.clone(),
                to: to.clone(),
                amount,
            },
        )
    }

    fn credit(env: &mut Env<'_>, to: &AccountId, amount: Amount) -> VmResult<()> {
        let balance = Self::balance_of(env, to)?;
        env.set(BALANCES, &[to.as_str()], &balance.try_add(&amount)?)
    }
}

fn emit<T: Serialize>(env: &mut Env<'_>, event: &str, data: &T) -> VmResult<()> {
    let data = serde_json::to_value(data)
        .map_err(|e| coffer_vm::VmError::InvalidValue(e.to_string()))?;
    env.emit(event, data);
    Ok(())
}

impl Contract for CurrencyStub {
    fn exports(&self) -> &'static [&'static str] {
        &["mint", "balance_of", "allowance", "approve", "transfer", "transfer_from"]
    }

    fn call(&self, env: &mut Env<'_>, function: &str, kwargs: &Kwargs) -> VmResult<Value> {
        match function {
            "mint" => {
                kwargs.expect_only(&["amount", "to"])?;
                Self::mint(env, kwargs.required("amount")?, &kwargs.required("to")?)?;
                Ok(Value::Null)
            }
            "balance_of" => {
                kwargs.expect_only(&["account"])?;
                let balance = Self::balance_of(env, &kwargs.required("account")?)?;
                Ok(Value::String(balance.to_string()))
            }
            "allowance" => {
                kwargs.expect_only(&["owner", "spender"])?;
                let allowed =
                    Self::allowance(env, &kwargs.required("owner")?, &kwargs.required("spender")?)?;
                Ok(Value::String(allowed.to_string()))
            }
            "approve" => {
                kwargs.expect_only(&["amount", "to"])?;
                Self::approve(env, kwargs.required("amount")?, &kwargs.required("to")?)?;
                Ok(Value::Null)
            }
            "transfer" => {
                kwargs.expect_only(&["amount", "to"])?;
                Self::transfer(env, kwargs.required("amount")?, &kwargs.required("to")?)?;
                Ok(Value::Null)
            }
            "transfer_from" => {
                kwargs.expect_only(&["amount", "to", "main_account"])?;
                Self::transfer_from(
                    env,
                    kwargs.required("amount")?,
                    &kwargs.required("to")?,
                    &kwargs.required("main_account")?,
                )?;
                Ok(Value::Null)
            }
            other => unreachable!("{} is not exported", other),
        }
    }
}
