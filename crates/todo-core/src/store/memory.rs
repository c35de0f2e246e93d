use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KvStore, StoreError, prefix_end};

/// Volatile store kept in a sorted map.
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all namespaces.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn prefix_range(prefix: &str) -> (Bound<String>, Bound<String>) {
    let end = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    (Bound::Included(prefix.to_string()), end)
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.write().await.remove(key);
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .range(prefix_range(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let keys: Vec<String> = inner
            .range(prefix_range(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            inner.remove(key);
        }
        Ok(keys.len())
    }
}
