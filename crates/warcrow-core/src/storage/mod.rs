//! Key-value storage standing in for browser local and session storage.
//!
//! - `KeyValueStorage`: the synchronous storage interface
//! - `MemoryStorage`: process-local storage (session storage, tests)
//! - `FileStorage`: one JSON file per key in a directory
//! - `StorageKey`: the structured key tokenizer used by cache cleanup

pub mod file;
pub mod key;
pub mod memory;

use thiserror::Error;

pub use file::FileStorage;
pub use key::{KeyClass, StorageKey};
pub use memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value store.
///
/// Mirrors the Web Storage API. Implementations must be safe to share
/// between the guard, the session and the watcher task.
pub trait KeyValueStorage: Send + Sync {
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.keys()?.is_empty())
    }
}
