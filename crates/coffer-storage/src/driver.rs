//! State driver with a pending write set.
//!
//! Reads see the pending set first, then committed state. A transaction is
//! the span between two `commit`/`rollback` calls; the driver itself does
//! not serialize transactions, the execution client does.

use crate::{StorageError, SNAPSHOT_FILE};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Staged writes captured by [`Driver::savepoint`].
#[derive(Debug, Clone)]
pub struct Savepoint(BTreeMap<String, Value>);

/// Keyed contract state.
#[derive(Debug, Default)]
pub struct Driver {
    committed: RwLock<BTreeMap<String, Value>>,
    /// `Value::Null` marks a staged delete
    pending: RwLock<BTreeMap<String, Value>>,
    dir: Option<PathBuf>,
}

impl Driver {
    /// Driver that keeps state in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Driver backed by `dir/state.json`, loading it if present.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;

        let snapshot = dir.join(SNAPSHOT_FILE);
        let committed = if snapshot.exists() {
            let content = fs::read_to_string(&snapshot)?;
            serde_json::from_str::<BTreeMap<String, Value>>(&content)
                .map_err(|e| StorageError::Deserialization(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        tracing::info!("Loaded {} state entries from {}", committed.len(), snapshot.display());

        Ok(Self {
            committed: RwLock::new(committed),
            pending: RwLock::new(BTreeMap::new()),
            dir: Some(dir.to_path_buf()),
        })
    }

    /// Directory the snapshot is written to, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Current value at `key`, pending writes included.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.pending.read().get(key) {
            return match value {
                Value::Null => None,
                v => Some(v.clone()),
            };
        }
        self.committed.read().get(key).cloned()
    }

    /// Stage a write. `Value::Null` stages a delete.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.pending.write().insert(key.into(), value);
    }

    /// Stage a delete.
    pub fn delete(&self, key: impl Into<String>) {
        self.set(key, Value::Null);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.read().is_empty()
    }

    /// Capture the staged writes so a failed nested call can be undone.
    pub fn savepoint(&self) -> Savepoint {
        Savepoint(self.pending.read().clone())
    }

    /// Return the staged writes to a previous savepoint.
    pub fn restore(&self, savepoint: Savepoint) {
        *self.pending.write() = savepoint.0;
    }

    /// Apply staged writes and return them, deletes reported as `Null`.
    ///
    /// The staged writes are consumed either way. If the snapshot cannot be
    /// written, committed state is left as it was.
    pub fn commit(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        let writes = std::mem::take(&mut *self.pending.write());
        if writes.is_empty() {
            return Ok(writes);
        }

        let mut committed = self.committed.write();
        let mut next = committed.clone();
        for (key, value) in &writes {
            if value.is_null() {
                next.remove(key);
            } else {
                next.insert(key.clone(), value.clone());
            }
        }

        self.persist(&next)?;
        *committed = next;
        Ok(writes)
    }

    /// Drop staged writes, returning how many were discarded.
    pub fn rollback(&self) -> usize {
        let mut pending = self.pending.write();
        let discarded = pending.len();
        pending.clear();
        discarded
    }

    /// Wipe all state, staged and committed.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.pending.write().clear();
        let mut committed = self.committed.write();
        self.persist(&BTreeMap::new())?;
        committed.clear();
        tracing::info!("State flushed");
        Ok(())
    }

    /// Visible keys starting with `prefix`, in order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let committed = self.committed.read();
        let pending = self.pending.read();

        let mut keys: Vec<String> = committed
            .keys()
            .filter(|k| k.starts_with(prefix) && !matches!(pending.get(*k), Some(Value::Null)))
            .cloned()
            .collect();
        keys.extend(
            pending
                .iter()
                .filter(|(k, v)| k.starts_with(prefix) && !v.is_null() && !committed.contains_key(*k))
                .map(|(k, _)| k.clone()),
        );
        keys.sort();
        keys
    }

    fn persist(&self, data: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data)?;
        let tmp = dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, dir.join(SNAPSHOT_FILE))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_pending_visible_before_commit() {
        let driver = Driver::in_memory();
        driver.set("currency.balances:alice", json!("10"));
        assert_eq!(driver.get("currency.balances:alice"), Some(json!("10")));
        assert!(driver.has_pending());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let driver = Driver::in_memory();
        driver.set("currency.balances:alice", json!("10"));
        driver.commit().unwrap();

        driver.set("currency.balances:alice", json!("4"));
        driver.set("currency.balances:bob", json!("6"));
        assert_eq!(driver.rollback(), 2);

        assert_eq!(driver.get("currency.balances:alice"), Some(json!("10")));
        assert_eq!(driver.get("currency.balances:bob"), None);
    }

    #[test]
    fn test_savepoint_restore() {
        let driver = Driver::in_memory();
        driver.set("currency.balances:alice", json!("10"));
        let savepoint = driver.savepoint();

        driver.set("currency.balances:alice", json!("0"));
        driver.set("currency.balances:bob", json!("10"));
        driver.restore(savepoint);

        assert_eq!(driver.get("currency.balances:alice"), Some(json!("10")));
        assert_eq!(driver.get("currency.balances:bob"), None);
        assert!(driver.has_pending());
    }

    #[test]
    fn test_commit_returns_writes_and_applies_deletes() {
        let driver = Driver::in_memory();
        driver.set("a.x", json!(1));
        driver.set("a.y", json!(2));
        driver.commit().unwrap();

        driver.delete("a.x");
        assert_eq!(driver.get("a.x"), None);
        let writes = driver.commit().unwrap();
        assert_eq!(writes.get("a.x"), Some(&Value::Null));
        assert_eq!(driver.get("a.x"), None);
        assert_eq!(driver.get("a.y"), Some(json!(2)));
    }

    #[test]
    fn test_failed_persist_keeps_committed_state() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("state");
        let driver = Driver::open(&dir).unwrap();
        driver.set("currency.balances:alice", json!("10"));
        driver.commit().unwrap();

        fs::remove_dir_all(&dir).unwrap();
        driver.set("currency.balances:alice", json!("110"));
        driver.set("currency.balances:bob", json!("5"));

        assert!(matches!(driver.commit(), Err(StorageError::Io(_))));
        assert!(!driver.has_pending());
        assert_eq!(driver.get("currency.balances:alice"), Some(json!("10")));
        assert_eq!(driver.get("currency.balances:bob"), None);
    }

    #[test]
    fn test_keys_with_prefix() {
        let driver = Driver::in_memory();
        driver.set("currency.balances:alice", json!("1"));
        driver.set("currency.balances:bob", json!("1"));
        driver.commit().unwrap();
        driver.set("currency.balances:carol", json!("1"));
        driver.delete("currency.balances:bob");
        driver.set("con_safe.safe:alice", json!("1"));

        assert_eq!(
            driver.keys_with_prefix("currency.balances:"),
            vec!["currency.balances:alice", "currency.balances:carol"]
        );
    }

    #[test]
    fn test_flush() {
        let driver = Driver::in_memory();
        driver.set("a.x", json!(1));
        driver.commit().unwrap();
        driver.set("a.y", json!(1));
        driver.flush().unwrap();
        assert_eq!(driver.get("a.x"), None);
        assert_eq!(driver.get("a.y"), None);
        assert!(!driver.has_pending());
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let driver = Driver::open(temp_dir.path()).unwrap();
            driver.set("con_safe.safe:alice", json!("150"));
            driver.commit().unwrap();
            driver.set("con_safe.safe:bob", json!("1"));
            driver.rollback();
        }

        let reopened = Driver::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.get("con_safe.safe:alice"), Some(json!("150")));
        assert_eq!(reopened.get("con_safe.safe:bob"), None);
        assert_eq!(reopened.dir(), Some(temp_dir.path()));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(SNAPSHOT_FILE), "not json").unwrap();
        assert!(matches!(
            Driver::open(temp_dir.path()),
            Err(StorageError::Deserialization(_))
        ));
    }
}
