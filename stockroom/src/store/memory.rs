//! In-process record store
//!
//! Documents live in a `BTreeMap` per scope, so listing is by key. The
//! offline switch and the rejected-key set let tests stage backend failures.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use stockroom_common::{
    merge_into, Document, RecordStore, Scope, StoreError, StoreResult, WriteMode,
};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    scopes: Mutex<HashMap<Scope, BTreeMap<String, Document>>>,
    offline: AtomicBool,
    rejected_keys: Mutex<HashSet<String>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreError::Unreachable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every later `put` or `delete` of `key` fail.
    pub async fn reject_writes_to(&self, key: impl Into<String>) {
        self.rejected_keys.lock().await.insert(key.into());
    }

    /// Number of successful puts and deletes so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unreachable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn ensure_accepted(&self, key: &str) -> StoreResult<()> {
        if self.rejected_keys.lock().await.contains(key) {
            Err(StoreError::Unreachable(format!("change to '{}' rejected", key)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, scope: &Scope, key: &str) -> StoreResult<Option<Document>> {
        self.ensure_online()?;
        let scopes = self.scopes.lock().await;
        Ok(scopes.get(scope).and_then(|docs| docs.get(key)).cloned())
    }

    async fn list(&self, scope: &Scope) -> StoreResult<Vec<(String, Document)>> {
        self.ensure_online()?;
        let scopes = self.scopes.lock().await;
        Ok(scopes
            .get(scope)
            .map(|docs| {
                docs.iter()
                    .map(|(key, doc)| (key.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(
        &self,
        scope: &Scope,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> StoreResult<()> {
        self.ensure_online()?;
        self.ensure_accepted(key).await?;

        let mut scopes = self.scopes.lock().await;
        let docs = scopes.entry(scope.clone()).or_default();
        match mode {
            WriteMode::Replace => {
                docs.insert(key.to_string(), document);
            }
            WriteMode::Merge => merge_into(docs.entry(key.to_string()).or_default(), document),
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> StoreResult<()> {
        self.ensure_online()?;
        self.ensure_accepted(key).await?;
        let mut scopes = self.scopes.lock().await;
        if let Some(docs) = scopes.get_mut(scope) {
            docs.remove(key);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn scope(id: &str) -> Scope {
        Scope::new(id).unwrap()
    }

    #[tokio::test]
    async fn replace_overwrites_whole_document() {
        let store = MemoryStore::new();
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
        assert_eq!(stored, doc(json!({ "quantity": 2 })));
    }

    #[tokio::test]
    async fn merge_preserves_other_fields() {
        let store = MemoryStore::new();
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
    async fn scopes_are_isolated() {
        let store = MemoryStore::new();
        store
            .put(&scope("u1"), "bolt", doc(json!({})), WriteMode::Replace)
            .await
            .unwrap();

        assert!(store.list(&scope("u2")).await.unwrap().is_empty());
        assert!(store.get(&scope("u2"), "bolt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_ordered_by_key() {
        let store = MemoryStore::new();
        let s = scope("u1");
        for key in ["nut", "bolt", "gear"] {
            store.put(&s, key, doc(json!({})), WriteMode::Replace).await.unwrap();
        }
        assert_eq!(store.keys(&s).await.unwrap(), vec!["bolt", "gear", "nut"]);
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        store.delete(&scope("u1"), "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store.list(&scope("u1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn rejected_key_fails_put_and_delete() {
        let store = MemoryStore::new();
        let s = scope("u1");
        store.put(&s, "bolt", doc(json!({ "quantity": 1 })), WriteMode::Replace).await.unwrap();
        store.reject_writes_to("bolt").await;

        assert!(store.put(&s, "bolt", doc(json!({})), WriteMode::Replace).await.is_err());
        assert!(store.delete(&s, "bolt").await.is_err());
        assert!(store.put(&s, "nut", doc(json!({})), WriteMode::Replace).await.is_ok());
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.get(&s, "bolt").await.unwrap(), Some(doc(json!({ "quantity": 1 }))));
    }
}
