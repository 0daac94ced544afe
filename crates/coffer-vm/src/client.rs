//! Execution client: contract registry, transactions and raw state access.

use crate::call_stack::CallStack;
use crate::context::{Call, Context};
use crate::contract::Contract;
use crate::env::Env;
use crate::error::{VmError, VmResult};
use crate::kwargs::Kwargs;
use crate::receipt::{call_hash, Event, Receipt};
use crate::{DEFAULT_SIGNER, MAX_CALL_DEPTH, SUBMITTED_MARKER};
use coffer_storage::{Driver, StorageKey};
use coffer_types::AccountId;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pseudo-function name used for the constructor frame.
const CONSTRUCT: &str = "__construct__";

/// Client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Signer used by [`ContractHandle::call`]
    pub default_signer: String,
    /// Maximum nested call depth per transaction
    pub max_call_depth: usize,
    /// Whether a contract may be re-entered while on the call stack
    pub allow_reentrancy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_signer: DEFAULT_SIGNER.to_string(),
            max_call_depth: MAX_CALL_DEPTH,
            allow_reentrancy: true,
        }
    }
}

/// Runs contract calls against a [`Driver`].
///
/// Each call is a transaction: its writes become visible only if the whole
/// call tree succeeds. Transactions are serialized.
pub struct Client {
    driver: Arc<Driver>,
    contracts: RwLock<BTreeMap<AccountId, Arc<dyn Contract>>>,
    config: ClientConfig,
    tx_lock: Mutex<()>,
    nonce: AtomicU64,
}

impl Client {
    /// Client over fresh in-memory state.
    pub fn new() -> Self {
        Self::with_driver(Arc::new(Driver::in_memory()), ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_driver(Arc::new(Driver::in_memory()), config)
    }

    pub fn with_driver(driver: Arc<Driver>, config: ClientConfig) -> Self {
        Self {
            driver,
            contracts: RwLock::new(BTreeMap::new()),
            config,
            tx_lock: Mutex::new(()),
            nonce: AtomicU64::new(0),
        }
    }

    /// Client over state persisted in `dir`.
    pub fn open(dir: &Path, config: ClientConfig) -> VmResult<Self> {
        let driver = Driver::open(dir)?;
        Ok(Self::with_driver(Arc::new(driver), config))
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Wipe all state and unregister every contract.
    pub fn flush(&self) -> VmResult<()> {
        let _guard = self.tx_lock.lock();
        self.driver.flush()?;
        self.contracts.write().clear();
        Ok(())
    }

    /// Register `contract` under `name` and run its constructor.
    ///
    /// When the state already carries a submission marker for `name`
    /// (state reopened from disk), the code is attached without running
    /// the constructor again.
    pub fn submit<C: Contract + 'static>(&self, name: &str, contract: C) -> VmResult<()> {
        let id = AccountId::new(name)?;
        let signer = AccountId::new(self.config.default_signer.as_str())?;
        {
            let mut contracts = self.contracts.write();
            if contracts.contains_key(&id) {
                return Err(VmError::DuplicateContract(id.into_string()));
            }
            contracts.insert(id.clone(), Arc::new(contract));
        }

        let _guard = self.tx_lock.lock();
        let marker = StorageKey::variable(id.as_str(), SUBMITTED_MARKER)?.to_string();
        if self.driver.get(&marker).is_some() {
            tracing::debug!(contract = %id, "Attached to existing contract state");
            return Ok(());
        }

        match self.construct(&id, signer) {
            Ok(()) => {
                self.driver.set(marker, Value::Bool(true));
                self.driver.commit()?;
                tracing::info!(contract = %id, "Contract submitted");
                Ok(())
            }
            Err(e) => {
                self.driver.rollback();
                self.contracts.write().remove(&id);
                tracing::warn!(contract = %id, error = %e, "Contract constructor failed");
                Err(e)
            }
        }
    }

    fn construct(&self, id: &AccountId, signer: AccountId) -> VmResult<()> {
        let contract = self.lookup(id)?;
        let mut stack = self.new_stack();
        let mut events = Vec::new();
        let ctx = Context::top_level(signer, id.clone(), CONSTRUCT);
        stack.enter(&ctx.this, &ctx.caller, CONSTRUCT)?;
        let mut env = Env::new(ctx, self, &mut stack, &mut events);
        contract.construct(&mut env)
    }

    /// Handle for calling a submitted contract.
    pub fn get_contract(&self, name: &str) -> VmResult<ContractHandle<'_>> {
        let id = AccountId::new(name)?;
        if !self.contracts.read().contains_key(&id) {
            return Err(VmError::ContractNotFound(id.into_string()));
        }
        Ok(ContractHandle { client: self, name: id })
    }

    /// Names of all registered contracts.
    pub fn contract_names(&self) -> Vec<AccountId> {
        self.contracts.read().keys().cloned().collect()
    }

    /// Run one transaction. Contract failures are reported in the receipt,
    /// with every write of the transaction discarded.
    pub fn execute(&self, call: Call) -> Receipt {
        let _guard = self.tx_lock.lock();
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let hash = call_hash(nonce, &call);

        let mut stack = self.new_stack();
        let mut events = Vec::new();
        let ctx = Context::top_level(call.signer.clone(), call.contract.clone(), &call.function);

        match self.dispatch(ctx, &call.function, &call.kwargs, &mut stack, &mut events) {
            Ok(value) => match self.driver.commit() {
                Ok(writes) => {
                    tracing::debug!(
                        contract = %call.contract,
                        function = %call.function,
                        signer = %call.signer,
                        writes = writes.len(),
                        "Transaction committed"
                    );
                    Receipt::success(hash, &call, value, events, writes)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to persist committed state");
                    Receipt::failure(hash, &call, e.into())
                }
            },
            Err(e) => {
                let discarded = self.driver.rollback();
                tracing::warn!(
                    contract = %call.contract,
                    function = %call.function,
                    signer = %call.signer,
                    discarded,
                    error = %e,
                    "Transaction reverted"
                );
                Receipt::failure(hash, &call, e)
            }
        }
    }

    /// Execute one call frame. A failed frame leaves no staged writes or
    /// events behind, even when its caller handles the error.
    pub(crate) fn dispatch(
        &self,
        ctx: Context,
        function: &str,
        kwargs: &Kwargs,
        stack: &mut CallStack,
        events: &mut Vec<Event>,
    ) -> VmResult<Value> {
        let contract = self.lookup(&ctx.this)?;
        if !contract.exports().contains(&function) {
            return Err(VmError::FunctionNotExported {
                contract: ctx.this.into_string(),
                function: function.to_string(),
            });
        }

        let depth = stack.enter(&ctx.this, &ctx.caller, function)?;
        tracing::debug!(contract = %ctx.this, function, caller = %ctx.caller, depth, "Call");

        let savepoint = self.driver.savepoint();
        let event_mark = events.len();
        let result = {
            let mut env = Env::new(ctx, self, stack, events);
            contract.call(&mut env, function, kwargs)
        };
        stack.exit()?;

        if result.is_err() {
            self.driver.restore(savepoint);
            events.truncate(event_mark);
        }
        result
    }

    /// Raw committed value of `contract.variable:keys`.
    pub fn get_var(&self, contract: &str, variable: &str, keys: &[&str]) -> VmResult<Option<Value>> {
        let key = StorageKey::new(contract, variable, keys)?;
        Ok(self.driver.get(&key.to_string()))
    }

    /// Overwrite `contract.variable:keys` directly and commit. `Null` deletes.
    pub fn set_var(&self, contract: &str, variable: &str, keys: &[&str], value: Value) -> VmResult<()> {
        let key = StorageKey::new(contract, variable, keys)?;
        let _guard = self.tx_lock.lock();
        self.driver.set(key.to_string(), value);
        self.driver.commit()?;
        Ok(())
    }

    fn lookup(&self, id: &AccountId) -> VmResult<Arc<dyn Contract>> {
        self.contracts
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| VmError::ContractNotFound(id.to_string()))
    }

    fn new_stack(&self) -> CallStack {
        CallStack::with_limits(self.config.max_call_depth, self.config.allow_reentrancy)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// A submitted contract bound to its client.
#[derive(Clone)]
pub struct ContractHandle<'a> {
    client: &'a Client,
    name: AccountId,
}

impl ContractHandle<'_> {
    pub fn name(&self) -> &AccountId {
        &self.name
    }

    /// Call as the client's default signer.
    pub fn call(&self, function: &str, kwargs: Kwargs) -> VmResult<Value> {
        self.call_as(&self.client.config.default_signer, function, kwargs)
    }

    /// Call as `signer`; returns the function result or the failure.
    pub fn call_as(&self, signer: &str, function: &str, kwargs: Kwargs) -> VmResult<Value> {
        self.transact(signer, function, kwargs)?.into_result()
    }

    /// Call as `signer` and keep the full receipt. Only an invalid signer
    /// name is an `Err` here; contract failures are in the receipt.
    pub fn transact(&self, signer: &str, function: &str, kwargs: Kwargs) -> VmResult<Receipt> {
        let signer = AccountId::new(signer)?;
        let call = Call::new(signer, self.name.clone(), function, kwargs);
        Ok(self.client.execute(call))
    }

    /// Call as the default signer and decode the result.
    pub fn query<T: DeserializeOwned>(&self, function: &str, kwargs: Kwargs) -> VmResult<T> {
        let value = self.call(function, kwargs)?;
        serde_json::from_value(value).map_err(|e| VmError::InvalidValue(e.to_string()))
    }

    /// Raw value of one of this contract's variables.
    pub fn get_var(&self, variable: &str, keys: &[&str]) -> VmResult<Option<Value>> {
        self.client.get_var(self.name.as_str(), variable, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kwargs, require};
    use serde_json::json;
    use tempfile::TempDir;

    /// Counter keyed by caller, with hooks for exercising the client.
    struct Counter;

    impl Contract for Counter {
        fn exports(&self) -> &'static [&'static str] {
            &["incr", "get", "whoami", "incr_then_fail", "relay", "relay_lenient", "recurse"]
        }

        fn construct(&self, env: &mut Env<'_>) -> VmResult<()> {
            let owner = env.ctx().signer.clone();
            env.set("owner", &[], &owner)
        }

        fn call(&self, env: &mut Env<'_>, function: &str, kwargs: &Kwargs) -> VmResult<Value> {
            match function {
                "incr" => {
                    let by: u64 = kwargs.required("by")?;
                    let caller = env.ctx().caller.clone();
                    let current: u64 = env.get("counts", &[caller.as_str()])?;
                    env.set("counts", &[caller.as_str()], &(current + by))?;
                    env.emit("Incr", json!({ "by": by }));
                    Ok(Value::Null)
                }
                "get" => {
                    let account: String = kwargs.required("account")?;
                    let current: u64 = env.get("counts", &[account.as_str()])?;
                    Ok(json!(current))
                }
                "whoami" => Ok(json!({
                    "caller": env.ctx().caller,
                    "signer": env.ctx().signer,
                    "this": env.ctx().this,
                })),
                "incr_then_fail" => {
                    env.set("counts", &["ghost"], &1u64)?;
                    env.emit("Ghost", Value::Null);
                    require!(false, "boom");
                    Ok(Value::Null)
                }
                "relay" => {
                    let target: String = kwargs.required("target")?;
                    let function: String = kwargs.required("function")?;
                    env.call(&target, &function, kwargs! { by: 1 })
                }
                "relay_lenient" => {
                    env.set("counts", &["outer"], &1u64)?;
                    let target: String = kwargs.required("target")?;
                    let inner = env.call(&target, "incr_then_fail", Kwargs::new());
                    Ok(json!(inner.is_err()))
                }
                "recurse" => {
                    let this = env.ctx().this.clone();
                    env.call(this.as_str(), "recurse", Kwargs::new())
                }
                _ => unreachable!(),
            }
        }
    }

    fn client_with_counters() -> Client {
        let client = Client::new();
        client.submit("con_a", Counter).unwrap();
        client.submit("con_b", Counter).unwrap();
        client
    }

    #[test]
    fn test_submit_runs_constructor_and_marks() {
        let client = client_with_counters();
        assert_eq!(client.get_var("con_a", "owner", &[]).unwrap(), Some(json!("sys")));
        assert_eq!(
            client.get_var("con_a", SUBMITTED_MARKER, &[]).unwrap(),
            Some(json!(true))
        );
        assert_eq!(client.contract_names().len(), 2);
    }

    #[test]
    fn test_duplicate_and_invalid_names() {
        let client = client_with_counters();
        assert_eq!(
            client.submit("con_a", Counter),
            Err(VmError::DuplicateContract("con_a".to_string()))
        );
        assert!(matches!(client.submit("con.x", Counter), Err(VmError::InvalidName(_))));
    }

    #[test]
    fn test_call_commits_and_reports() {
        let client = client_with_counters();
        let counter = client.get_contract("con_a").unwrap();

        let receipt = counter.transact("alice", "incr", kwargs! { by: 3 }).unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.writes.get("con_a.counts:alice"), Some(&json!(3)));
        assert_eq!(receipt.events_named("Incr").count(), 1);

        let value: u64 = counter.query("get", kwargs! { account: "alice" }).unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let client = client_with_counters();
        let counter = client.get_contract("con_a").unwrap();

        let receipt = counter.transact("alice", "incr_then_fail", Kwargs::new()).unwrap();
        assert_eq!(receipt.status_code, 1);
        assert_eq!(receipt.result, Err(VmError::Assertion("boom".to_string())));
        assert!(receipt.events.is_empty());
        assert_eq!(client.get_var("con_a", "counts", &["ghost"]).unwrap(), None);
        assert!(!client.driver().has_pending());
    }

    #[test]
    fn test_nested_call_sees_contract_as_caller() {
        let client = client_with_counters();
        let a = client.get_contract("con_a").unwrap();

        a.call_as("alice", "relay", kwargs! { target: "con_b", function: "incr" })
            .unwrap();
        assert_eq!(client.get_var("con_b", "counts", &["con_a"]).unwrap(), Some(json!(1)));
        assert_eq!(client.get_var("con_b", "counts", &["alice"]).unwrap(), None);

        let who = a
            .call_as("alice", "relay", kwargs! { target: "con_b", function: "whoami" })
            .unwrap();
        assert_eq!(who, json!({"caller": "con_a", "signer": "alice", "this": "con_b"}));
    }

    #[test]
    fn test_handled_nested_failure_keeps_outer_writes_only() {
        let client = client_with_counters();
        let a = client.get_contract("con_a").unwrap();

        let receipt = a
            .transact("alice", "relay_lenient", kwargs! { target: "con_b" })
            .unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.result, Ok(json!(true)));
        assert!(receipt.events_named("Ghost").next().is_none());
        assert_eq!(client.get_var("con_a", "counts", &["outer"]).unwrap(), Some(json!(1)));
        assert_eq!(client.get_var("con_b", "counts", &["ghost"]).unwrap(), None);
    }

    #[test]
    fn test_unknown_contract_and_function() {
        let client = client_with_counters();
        assert!(matches!(
            client.get_contract("con_missing"),
            Err(VmError::ContractNotFound(_))
        ));

        let a = client.get_contract("con_a").unwrap();
        assert!(matches!(
            a.call("withdraw", Kwargs::new()),
            Err(VmError::FunctionNotExported { .. })
        ));
        assert!(matches!(
            a.call_as("alice", "relay", kwargs! { target: "con_zzz", function: "incr" }),
            Err(VmError::ContractNotFound(_))
        ));
    }

    #[test]
    fn test_call_depth_limit() {
        let client = Client::with_config(ClientConfig {
            max_call_depth: 8,
            ..ClientConfig::default()
        });
        client.submit("con_a", Counter).unwrap();
        let a = client.get_contract("con_a").unwrap();
        assert_eq!(
            a.call("recurse", Kwargs::new()),
            Err(VmError::CallDepthExceeded { depth: 8 })
        );
    }

    #[test]
    fn test_reentrancy_can_be_disallowed() {
        let client = Client::with_config(ClientConfig {
            allow_reentrancy: false,
            ..ClientConfig::default()
        });
        client.submit("con_a", Counter).unwrap();
        let a = client.get_contract("con_a").unwrap();
        assert!(matches!(
            a.call("recurse", Kwargs::new()),
            Err(VmError::ReentrancyViolation(_))
        ));
    }

    #[test]
    fn test_invalid_signer() {
        let client = client_with_counters();
        let a = client.get_contract("con_a").unwrap();
        assert!(matches!(
            a.call_as("bad signer", "incr", kwargs! { by: 1 }),
            Err(VmError::InvalidName(_))
        ));
    }

    #[test]
    fn test_set_var_and_flush() {
        let client = client_with_counters();
        client.set_var("con_a", "counts", &["bob"], json!(9)).unwrap();
        let a = client.get_contract("con_a").unwrap();
        assert_eq!(a.query::<u64>("get", kwargs! { account: "bob" }).unwrap(), 9);

        client.flush().unwrap();
        assert_eq!(client.get_var("con_a", "counts", &["bob"]).unwrap(), None);
        assert!(client.contract_names().is_empty());
        assert!(client.get_contract("con_a").is_err());
    }

    #[test]
    fn test_reopen_attaches_without_reconstructing() {
        let temp_dir = TempDir::new().unwrap();
        {
            let client = Client::open(temp_dir.path(), ClientConfig::default()).unwrap();
            client.submit("con_a", Counter).unwrap();
            client.set_var("con_a", "owner", &[], json!("alice")).unwrap();
        }

        let client = Client::open(temp_dir.path(), ClientConfig::default()).unwrap();
        client.submit("con_a", Counter).unwrap();
        assert_eq!(client.get_var("con_a", "owner", &[]).unwrap(), Some(json!("alice")));
    }
}
