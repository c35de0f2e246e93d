//! Ordered key-value storage.
//!
//! The repositories only need point reads and writes plus prefix scans, so any
//! backend with sorted keys can host them. Keys are namespaced by a literal
//! prefix (`task:`, `user:`); values are JSON documents.

mod error;
pub use error::StoreError;

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use async_trait::async_trait;

/// Backend contract for the ordered key-value store.
///
/// Each individual operation must be atomic with respect to the others;
/// nothing beyond that is assumed. Implementations must be safe to share across tasks.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Read the value stored under `key`.
    ///
    /// Absence is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove `key`. Succeeds whether or not the key existed.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Return every entry whose key starts with `prefix`, in key order.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Returns the number of removed entries.
    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError>;
}

/// Smallest string that sorts after every string starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix, or a prefix made only of `char::MAX`),
/// in which case a scan has no upper bound.
pub(crate) fn prefix_end(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        if let Some(next) = next_char(last) {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

fn next_char(c: char) -> Option<char> {
    let mut code = c as u32 + 1;
    // Skip the surrogate range, which holds no valid chars.
    if (0xD800..=0xDFFF).contains(&code) {
        code = 0xE000;
    }
    char::from_u32(code)
}
