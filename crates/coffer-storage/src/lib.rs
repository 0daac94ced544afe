//! Coffer Storage - keyed contract state with transactional writes.
//!
//! Every piece of contract state lives under a flat string key
//! (`contract.variable:k1:k2`) holding a JSON value. Writes made during a
//! transaction are staged and only become visible to later transactions
//! once committed.

pub mod driver;
pub mod error;
pub mod key;

pub use driver::{Driver, Savepoint};
pub use error::StorageError;
pub use key::StorageKey;

/// Delimiter between contract and variable name
pub const INDEX_SEPARATOR: char = '.';

/// Delimiter between variable name and hash keys
pub const DELIMITER: char = ':';

/// Maximum number of dimensions in a hash key
pub const MAX_HASH_DIMENSIONS: usize = 16;

/// Maximum length of a full storage key in bytes
pub const MAX_KEY_SIZE: usize = 1024;

/// Snapshot file written by a directory-backed driver
pub const SNAPSHOT_FILE: &str = "state.json";
