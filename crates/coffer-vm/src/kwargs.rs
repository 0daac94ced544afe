//! Named call arguments.

use crate::error::{VmError, VmResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Keyword arguments of a contract call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Kwargs(Map<String, Value>);

impl Kwargs {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from a JSON object; `null` is treated as no arguments.
    pub fn from_value(value: Value) -> VmResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(VmError::InvalidValue(format!(
                "kwargs must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    /// Builder form of [`Kwargs::insert`] for serializable values.
    pub fn with<T: Serialize>(mut self, name: &str, value: &T) -> VmResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| VmError::InvalidArgument {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.insert(name, value);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Decode a mandatory argument.
    pub fn required<T: DeserializeOwned>(&self, name: &str) -> VmResult<T> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| VmError::MissingArgument(name.to_string()))?;
        decode(name, value)
    }

    /// Reject any argument not listed in `names`.
    pub fn expect_only(&self, names: &[&str]) -> VmResult<()> {
        match self.0.keys().find(|k| !names.contains(&k.as_str())) {
            Some(extra) => Err(VmError::UnexpectedArgument(extra.clone())),
            None => Ok(()),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> VmResult<T> {
    T::deserialize(value).map_err(|e| VmError::InvalidArgument {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

impl From<Map<String, Value>> for Kwargs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Kwargs {
    type Error = VmError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
