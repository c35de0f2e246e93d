use std::{path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{KvStore, StoreError, prefix_end};

/// Durable store on a single SQLite table with a primary-key index over `key`.
///
/// Prefix scans are range queries on that index, so they come back in key order.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let open_err = |e: &dyn std::fmt::Display| StoreError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| open_err(&e))?;
        }

        let conn = Connection::open(path).map_err(|e| open_err(&e))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| open_err(&e))?;
        // PRAGMA journal_mode returns a row.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .map_err(|e| open_err(&e))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            ) WITHOUT ROWID;",
        )
        .map_err(|e| open_err(&e))?;

        info!(path = %path.display(), "sqlite store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, String>(0)
        })
        .optional()
        .map_err(|e| StoreError::operation("get", key, e))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| StoreError::operation("put", key, e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| StoreError::operation("delete", key, e))?;
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let conn = self.conn.lock().await;
        let err = |e: rusqlite::Error| StoreError::operation("scan", prefix, e);

        let rows = match prefix_end(prefix) {
            Some(end) => {
                let mut stmt = conn
                    .prepare_cached(
                        "SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key",
                    )
                    .map_err(err)?;
                stmt.query_map(params![prefix, end], |row| Ok((row.get(0)?, row.get(1)?)))
                    .map_err(err)?
                    .collect::<Result<Vec<(String, String)>, _>>()
                    .map_err(err)?
            }
            None => {
                let mut stmt = conn
                    .prepare_cached("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")
                    .map_err(err)?;
                stmt.query_map(params![prefix], |row| Ok((row.get(0)?, row.get(1)?)))
                    .map_err(err)?
                    .collect::<Result<Vec<(String, String)>, _>>()
                    .map_err(err)?
            }
        };

        debug!(prefix, count = rows.len(), "sqlite scan");
        Ok(rows)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        // A single DELETE statement is atomic on its own.
        let removed = match prefix_end(prefix) {
            Some(end) => conn.execute(
                "DELETE FROM kv WHERE key >= ?1 AND key < ?2",
                params![prefix, end],
            ),
            None => conn.execute("DELETE FROM kv WHERE key >= ?1", params![prefix]),
        }
        .map_err(|e| StoreError::operation("clear_prefix", prefix, e))?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested").join("todo.db")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_overwrites_and_get_reads_back() {
        let (_dir, store) = open_temp();
        assert_eq!(store.get("task:1").await.unwrap(), None);

        store.put("task:1", "one".into()).await.unwrap();
        store.put("task:1", "uno".into()).await.unwrap();
        assert_eq!(store.get("task:1").await.unwrap().as_deref(), Some("uno"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = open_temp();
        store.put("k", "v".into()).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_and_clear_respect_namespaces() {
        let (_dir, store) = open_temp();
        store.put("task:b", "2".into()).await.unwrap();
        store.put("task:a", "1".into()).await.unwrap();
        store.put("user:a", "u".into()).await.unwrap();
        store.put("taskz", "x".into()).await.unwrap();

        let keys: Vec<String> = store
            .scan("task:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["task:a".to_string(), "task:b".to_string()]);

        assert_eq!(store.clear_prefix("task:").await.unwrap(), 2);
        assert!(store.scan("task:").await.unwrap().is_empty());
        assert_eq!(store.get("user:a").await.unwrap().as_deref(), Some("u"));
        assert_eq!(store.get("taskz").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.put("task:1", "kept".into()).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("task:1").await.unwrap().as_deref(), Some("kept"));
    }
}
