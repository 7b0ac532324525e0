//! SQLite-backed record store
//!
//! Each document is stored as JSON text under `(scope, key)`.
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Merge writes read and rewrite the document inside one transaction.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use stockroom_common::{
    merge_into, Document, RecordStore, Scope, StoreError, StoreResult, WriteMode,
};

/// Creates the `documents` table if it does not already exist.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            scope      TEXT NOT NULL,
            key        TEXT NOT NULL,
            body       TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (scope, key)
        );
        ",
    )?;

    log::debug!("Record store schema initialized");
    Ok(())
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating its parent directory.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::backend)?;
                log::info!("Created directory: {}", parent.display());
            }
        }
        let conn = Connection::open(path).map_err(StoreError::backend)?;
        log::info!("Opened record store: {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(StoreError::backend)?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn).map_err(StoreError::backend)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn decode(body: &str) -> StoreResult<Document> {
    Ok(serde_json::from_str(body)?)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, scope: &Scope, key: &str) -> StoreResult<Option<Document>> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE scope = ?1 AND key = ?2",
                params![scope.as_str(), key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::backend)?;
        body.as_deref().map(decode).transpose()
    }

    async fn list(&self, scope: &Scope) -> StoreResult<Vec<(String, Document)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT key, body FROM documents WHERE scope = ?1 ORDER BY key")
            .map_err(StoreError::backend)?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![scope.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(StoreError::backend)?
            .collect::<rusqlite::Result<_>>()
            .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|(key, body)| Ok((key, decode(&body)?)))
            .collect()
    }

    async fn keys(&self, scope: &Scope) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT key FROM documents WHERE scope = ?1 ORDER BY key")
            .map_err(StoreError::backend)?;
        let keys = stmt
            .query_map(params![scope.as_str()], |row| row.get(0))
            .map_err(StoreError::backend)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(StoreError::backend)?;
        Ok(keys)
    }

    async fn put(
        &self,
        scope: &Scope,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(StoreError::backend)?;

        let document = match mode {
            WriteMode::Replace => document,
            WriteMode::Merge => {
                let existing: Option<String> = tx
                    .query_row(
                        "SELECT body FROM documents WHERE scope = ?1 AND key = ?2",
                        params![scope.as_str(), key],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(StoreError::backend)?;
                let mut merged = match existing {
                    Some(body) => decode(&body)?,
                    None => Document::new(),
                };
                merge_into(&mut merged, document);
                merged
            }
        };

        let body = serde_json::to_string(&document)?;
        tx.execute(
            "INSERT INTO documents (scope, key, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope, key) DO UPDATE SET
                 body       = excluded.body,
                 updated_at = excluded.updated_at",
            params![scope.as_str(), key, body, now()],
        )
        .map_err(StoreError::backend)?;
        tx.commit().map_err(StoreError::backend)?;
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE scope = ?1 AND key = ?2",
            params![scope.as_str(), key],
        )
        .map_err(StoreError::backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn scope(id: &str) -> Scope {
        Scope::new(id).unwrap()
    }

    #[test]
    fn init_schema_creates_documents_table() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        let s = scope("u1");
        store
            .put(&s, "bolt", doc(json!({ "quantity": 3 })), WriteMode::Replace)
            .await
            .unwrap();

        let stored = store.get(&s, "bolt").await.unwrap().unwrap();
        assert_eq!(stored["quantity"], json!(3));
        assert!(store.get(&s, "nut").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_preserves_other_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let s = scope("u1");
        store
            .put(&s, "bolt", doc(json!({ "quantity": 1, "supplier": "Acme" })), WriteMode::Replace)
            .await
            .unwrap();
        store
            .put(&s, "bolt", doc(json!({ "quantity": 2 })), WriteMode::Merge)
            .await
            .unwrap();

        let stored = store.get(&s, "bolt").await.unwrap().unwrap();
        assert_eq!(stored["quantity"], json!(2));
        assert_eq!(stored["supplier"], json!("Acme"));
    }

    #[tokio::test]
    async fn merge_creates_missing_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        let s = scope("u1");
        store
            .put(&s, "gear", doc(json!({ "quantity": 1 })), WriteMode::Merge)
            .await
            .unwrap();
        assert_eq!(store.keys(&s).await.unwrap(), vec!["gear"]);
    }

    #[tokio::test]
    async fn replace_drops_other_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let s = scope("u1");
        store
            .put(&s, "bolt", doc(json!({ "quantity": 1, "supplier": "Acme" })), WriteMode::Replace)
            .await
            .unwrap();
        store
            .put(&s, "bolt", doc(json!({ "quantity": 2 })), WriteMode::Replace)
            .await
            .unwrap();

        let stored = store.get(&s, "bolt").await.unwrap().unwrap();
        assert!(stored.get("supplier").is_none());
    }

    #[tokio::test]
    async fn list_is_scoped_and_ordered() {
        let store = SqliteStore::open_in_memory().unwrap();
        for key in ["nut", "bolt"] {
            store
                .put(&scope("u1"), key, doc(json!({})), WriteMode::Replace)
                .await
                .unwrap();
        }
        store
            .put(&scope("u2"), "gear", doc(json!({})), WriteMode::Replace)
            .await
            .unwrap();

        let listed: Vec<String> = store
            .list(&scope("u1"))
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(listed, vec!["bolt", "nut"]);
        assert_eq!(store.keys(&scope("u2")).await.unwrap(), vec!["gear"]);
    }

    #[tokio::test]
    async fn delete_removes_only_target() {
        let store = SqliteStore::open_in_memory().unwrap();
        let s = scope("u1");
        for key in ["nut", "bolt"] {
            store.put(&s, key, doc(json!({})), WriteMode::Replace).await.unwrap();
        }
        store.delete(&s, "nut").await.unwrap();
        store.delete(&s, "ghost").await.unwrap();

        assert_eq!(store.keys(&s).await.unwrap(), vec!["bolt"]);
    }

    #[tokio::test]
    async fn open_creates_parent_directory_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("inventory.db");
        let s = scope("u1");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .put(&s, "bolt", doc(json!({ "quantity": 4 })), WriteMode::Replace)
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let stored = reopened.get(&s, "bolt").await.unwrap().unwrap();
        assert_eq!(stored["quantity"], json!(4));
    }

    #[tokio::test]
    async fn corrupt_body_is_an_encoding_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO documents (scope, key, body, updated_at) VALUES ('u1', 'bad', '{', '')",
                [],
            )
            .unwrap();
        }

        let err = store.get(&scope("u1"), "bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));
    }
}
