//! Storage key layout.
//!
//! `currency.balances:alice` is the `balances` hash entry for `alice` in
//! the `currency` contract; `currency.approvals:alice:con_safe` is a
//! two-dimensional entry. A plain variable has no `:` suffix.

use crate::{StorageError, DELIMITER, INDEX_SEPARATOR, MAX_HASH_DIMENSIONS, MAX_KEY_SIZE};
use std::fmt;
use std::str::FromStr;

/// Fully qualified location of a value in contract state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    contract: String,
    variable: String,
    keys: Vec<String>,
}

impl StorageKey {
    /// Key of a plain variable.
    pub fn variable(contract: &str, variable: &str) -> Result<Self, StorageError> {
        Self::new(contract, variable, &[] as &[&str])
    }

    /// Key of a hash entry; `keys` may be empty for a plain variable.
    pub fn new<K: AsRef<str>>(
        contract: &str,
        variable: &str,
        keys: &[K],
    ) -> Result<Self, StorageError> {
        check_name(contract)?;
        check_name(variable)?;
        if keys.len() > MAX_HASH_DIMENSIONS {
            return Err(StorageError::TooManyDimensions {
                max: MAX_HASH_DIMENSIONS,
                actual: keys.len(),
            });
        }
        let keys = keys
            .iter()
            .map(|k| {
                let k = k.as_ref();
                if k.is_empty() || k.contains(DELIMITER) {
                    Err(StorageError::InvalidKey(format!("bad hash key {:?}", k)))
                } else {
                    Ok(k.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let key = Self {
            contract: contract.to_string(),
            variable: variable.to_string(),
            keys,
        };
        let len = key.encoded_len();
        if len > MAX_KEY_SIZE {
            return Err(StorageError::KeyTooLong {
                max: MAX_KEY_SIZE,
                actual: len,
            });
        }
        Ok(key)
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn variable_name(&self) -> &str {
        &self.variable
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Prefix shared by every entry of this key's contract.
    pub fn contract_prefix(contract: &str) -> String {
        format!("{}{}", contract, INDEX_SEPARATOR)
    }

    fn encoded_len(&self) -> usize {
        self.contract.len()
            + 1
            + self.variable.len()
            + self.keys.iter().map(|k| k.len() + 1).sum::<usize>()
    }
}

fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains(INDEX_SEPARATOR) || name.contains(DELIMITER) {
        return Err(StorageError::InvalidKey(format!("bad name {:?}", name)));
    }
    Ok(())
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.contract, INDEX_SEPARATOR, self.variable)?;
        for k in &self.keys {
            write!(f, "{}{}", DELIMITER, k)?;
        }
        Ok(())
    }
}

impl FromStr for StorageKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, rest) = s
            .split_once(INDEX_SEPARATOR)
            .ok_or_else(|| StorageError::InvalidKey(s.to_string()))?;
        let mut parts = rest.split(DELIMITER);
        let variable = parts.next().unwrap_or_default();
        let keys: Vec<&str> = parts.collect();
        Self::new(contract, variable, &keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_variable() {
        let key = StorageKey::variable("con_safe", "__submitted__").unwrap();
        assert_eq!(key.to_string(), "con_safe.__submitted__");
    }

    #[test]
    fn test_multi_dimensional() {
        let key = StorageKey::new("currency", "approvals", &["alice", "con_safe"]).unwrap();
        assert_eq!(key.to_string(), "currency.approvals:alice:con_safe");

        let parsed: StorageKey = "currency.approvals:alice:con_safe".parse().unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.keys(), &["alice".to_string(), "con_safe".to_string()]);
    }

    #[test]
    fn test_rejects_delimiter_in_key() {
        assert!(matches!(
            StorageKey::new("currency", "balances", &["a:b"]),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            StorageKey::new("currency", "balances", &[""]),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(StorageKey::variable("cur.rency", "balances").is_err());
    }

    #[test]
    fn test_limits() {
        let keys: Vec<String> = (0..=MAX_HASH_DIMENSIONS).map(|i| i.to_string()).collect();
        assert!(matches!(
            StorageKey::new("c", "v", &keys),
            Err(StorageError::TooManyDimensions { .. })
        ));

        let long = "k".repeat(MAX_KEY_SIZE);
        assert!(matches!(
            StorageKey::new("c", "v", &[long]),
            Err(StorageError::KeyTooLong { .. })
        ));
    }
}
