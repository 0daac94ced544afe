//! Transaction outcome.

use crate::context::Call;
use crate::error::VmError;
use coffer_types::AccountId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Event emitted by a contract during a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub contract: AccountId,
    pub event: String,
    pub data: Value,
}

/// Outcome of executing one [`Call`].
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// blake3 digest of the call and its sequence number
    pub hash: String,
    pub signer: AccountId,
    pub contract: AccountId,
    pub function: String,
    /// 0 on success, 1 on failure
    pub status_code: u8,
    pub result: Result<Value, VmError>,
    /// Empty when the call failed
    pub events: Vec<Event>,
    /// Committed writes; empty when the call failed
    pub writes: BTreeMap<String, Value>,
}

impl Receipt {
    pub(crate) fn success(
        hash: String,
        call: &Call,
        value: Value,
        events: Vec<Event>,
        writes: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            hash,
            signer: call.signer.clone(),
            contract: call.contract.clone(),
            function: call.function.clone(),
            status_code: 0,
            result: Ok(value),
            events,
            writes,
        }
    }

    pub(crate) fn failure(hash: String, call: &Call, error: VmError) -> Self {
        Self {
            hash,
            signer: call.signer.clone(),
            contract: call.contract.clone(),
            function: call.function.clone(),
            status_code: 1,
            result: Err(error),
            events: Vec::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }

    pub fn into_result(self) -> Result<Value, VmError> {
        self.result
    }

    /// Events with the given name.
    pub fn events_named<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.event == event)
    }
}

/// Digest identifying a call within a client's lifetime.
pub(crate) fn call_hash(nonce: u64, call: &Call) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&nonce.to_le_bytes());
    hasher.update(call.signer.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(call.contract.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(call.function.as_bytes());
    hasher.update(&[0]);
    hasher.update(call.kwargs.to_value().to_string().as_bytes());
    hasher.finalize().to_hex().to_string()
}
