//! Calling convention seen by a running contract.

use crate::call_stack::CallStack;
use crate::client::Client;
use crate::context::Context;
use crate::error::{VmError, VmResult};
use crate::kwargs::Kwargs;
use crate::receipt::Event;
use coffer_storage::StorageKey;
use coffer_types::AccountId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Execution environment of one call frame.
///
/// State reads and writes are scoped to the executing contract
/// (`ctx.this`); other contracts' state is only reachable by calling them.
pub struct Env<'a> {
    ctx: Context,
    client: &'a Client,
    stack: &'a mut CallStack,
    events: &'a mut Vec<Event>,
}

impl<'a> Env<'a> {
    pub(crate) fn new(
        ctx: Context,
        client: &'a Client,
        stack: &'a mut CallStack,
        events: &'a mut Vec<Event>,
    ) -> Self {
        Self {
            ctx,
            client,
            stack,
            events,
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Current nesting depth, 1 for the top-level call.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Read `this.variable:keys`, yielding `T::default()` when unset.
    pub fn get<T: DeserializeOwned + Default>(&self, variable: &str, keys: &[&str]) -> VmResult<T> {
        match self.get_raw(variable, keys)? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                VmError::Storage(format!("{}.{} decode failed: {}", self.ctx.this, variable, e))
            }),
            None => Ok(T::default()),
        }
    }

    /// Raw value at `this.variable:keys`, `None` when unset.
    pub fn get_raw(&self, variable: &str, keys: &[&str]) -> VmResult<Option<Value>> {
        let key = StorageKey::new(self.ctx.this.as_str(), variable, keys)?;
        Ok(self.client.driver().get(&key.to_string()))
    }

    /// Stage a write to `this.variable:keys`.
    pub fn set<T: Serialize>(&mut self, variable: &str, keys: &[&str], value: &T) -> VmResult<()> {
        let key = StorageKey::new(self.ctx.this.as_str(), variable, keys)?;
        let value = serde_json::to_value(value).map_err(|e| VmError::InvalidValue(e.to_string()))?;
        self.client.driver().set(key.to_string(), value);
        Ok(())
    }

    /// Call an exported function of another contract. Inside the callee,
    /// `ctx.caller` is this contract and `ctx.signer` is unchanged.
    pub fn call(&mut self, contract: &str, function: &str, kwargs: Kwargs) -> VmResult<Value> {
        let target = AccountId::new(contract)?;
        let ctx = self.ctx.nested(target);
        self.client
            .dispatch(ctx, function, &kwargs, &mut *self.stack, &mut *self.events)
    }

    /// Record an event on the transaction receipt.
    pub fn emit(&mut self, event: &str, data: Value) {
        tracing::trace!(contract = %self.ctx.this, event, "event emitted");
        self.events.push(Event {
            contract: self.ctx.this.clone(),
            event: event.to_string(),
            data,
        });
    }
}
