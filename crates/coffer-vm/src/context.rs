//! Call context and transaction description.

use crate::kwargs::Kwargs;
use coffer_types::AccountId;
use serde::Serialize;

/// What a running contract knows about how it was invoked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    /// Account that started the transaction
    pub signer: AccountId,
    /// Immediate caller: the signer at top level, otherwise the calling contract
    pub caller: AccountId,
    /// Contract currently executing
    pub this: AccountId,
    /// Contract and function the transaction entered through
    pub entry: (AccountId, String),
}

impl Context {
    /// Context for the outermost call of a transaction.
    pub fn top_level(signer: AccountId, contract: AccountId, function: &str) -> Self {
        Self {
            caller: signer.clone(),
            signer,
            entry: (contract.clone(), function.to_string()),
            this: contract,
        }
    }

    /// Context for a call from `self.this` into `target`.
    pub fn nested(&self, target: AccountId) -> Self {
        Self {
            signer: self.signer.clone(),
            caller: self.this.clone(),
            this: target,
            entry: self.entry.clone(),
        }
    }
}

/// A transaction: one top-level call made by a signer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub signer: AccountId,
    pub contract: AccountId,
    pub function: String,
    pub kwargs: Kwargs,
}

impl Call {
    pub fn new(signer: AccountId, contract: AccountId, function: &str, kwargs: Kwargs) -> Self {
        Self {
            signer,
            contract,
            function: function.to_string(),
            kwargs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn test_top_level_caller_is_signer() {
        let ctx = Context::top_level(id("alice"), id("con_safe"), "deposit");
        assert_eq!(ctx.caller, "alice");
        assert_eq!(ctx.signer, "alice");
        assert_eq!(ctx.this, "con_safe");
    }

    #[test]
    fn test_nested_caller_is_contract() {
        let outer = Context::top_level(id("alice"), id("con_safe"), "deposit");
        let inner = outer.nested(id("currency"));
        assert_eq!(inner.caller, "con_safe");
        assert_eq!(inner.signer, "alice");
        assert_eq!(inner.this, "currency");
        assert_eq!(inner.entry, (id("con_safe"), "deposit".to_string()));
    }
}
