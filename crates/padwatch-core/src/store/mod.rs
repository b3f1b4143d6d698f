// ── Debounce store ──
//
// Keyed persistence for per-(device, condition) streak state. The
// counter and the remediated flag always travel together in one record,
// so a backend only ever replaces whole records.

mod file;
mod memory;

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{DebounceKey, DebounceRecord};

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable `(device, condition) -> DebounceRecord` map.
///
/// Implementations need no internal locking beyond what makes them
/// `Send + Sync`: callers guarantee a single evaluation cycle at a time.
pub trait DebounceStore: Send + Sync {
    fn get(&self, key: &DebounceKey) -> Result<Option<DebounceRecord>, StoreError>;

    /// Replace the record for `key` in a single write.
    fn put(&self, key: &DebounceKey, record: DebounceRecord) -> Result<(), StoreError>;

    /// Remove the record for `key`. Clearing an absent key is not an error.
    fn clear(&self, key: &DebounceKey) -> Result<(), StoreError>;

    /// Every persisted record, sorted by key.
    fn entries(&self) -> Result<Vec<(DebounceKey, DebounceRecord)>, StoreError>;
}
