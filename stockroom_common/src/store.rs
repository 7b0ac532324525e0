//! Record store contract
//!
//! A remote, namespaced document store: one collection of flat documents
//! per scope, addressed by string key. Implementations own no inventory
//! logic.

use crate::error::StoreResult;
use crate::item::{Document, Scope};
use async_trait::async_trait;

/// How `put` treats an existing document at the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The stored document becomes exactly the written one
    Replace,
    /// Written fields replace stored fields; other stored fields survive
    Merge,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, scope: &Scope, key: &str) -> StoreResult<Option<Document>>;

    /// Every document in the scope, in store-defined order
    async fn list(&self, scope: &Scope) -> StoreResult<Vec<(String, Document)>>;

    async fn put(
        &self,
        scope: &Scope,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> StoreResult<()>;

    /// Removing a missing key is not an error.
    async fn delete(&self, scope: &Scope, key: &str) -> StoreResult<()>;

    async fn keys(&self, scope: &Scope) -> StoreResult<Vec<String>> {
        Ok(self
            .list(scope)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }
}

/// Applies a merge write of `patch` onto `target`
pub fn merge_into(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        target.insert(field, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    /// Minimal store relying on the default `keys`
    #[derive(Default)]
    struct ListOnly {
        docs: Mutex<BTreeMap<String, Document>>,
    }

    #[async_trait]
    impl RecordStore for ListOnly {
        fn backend_tag(&self) -> &'static str {
            "list-only"
        }

        async fn get(&self, _scope: &Scope, key: &str) -> StoreResult<Option<Document>> {
            Ok(self.docs.lock().map_err(|_| StoreError::Poisoned)?.get(key).cloned())
        }

        async fn list(&self, _scope: &Scope) -> StoreResult<Vec<(String, Document)>> {
            let docs = self.docs.lock().map_err(|_| StoreError::Poisoned)?;
            Ok(docs.iter().map(|(k, d)| (k.clone(), d.clone())).collect())
        }

        async fn put(
            &self,
            _scope: &Scope,
            key: &str,
            document: Document,
            _mode: WriteMode,
        ) -> StoreResult<()> {
            self.docs
                .lock()
                .map_err(|_| StoreError::Poisoned)?
                .insert(key.to_string(), document);
            Ok(())
        }

        async fn delete(&self, _scope: &Scope, key: &str) -> StoreResult<()> {
            self.docs.lock().map_err(|_| StoreError::Poisoned)?.remove(key);
            Ok(())
        }
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut target = doc(json!({ "quantity": 1, "supplier": "Acme" }));
        merge_into(&mut target, doc(json!({ "quantity": 2 })));
        assert_eq!(target["quantity"], json!(2));
        assert_eq!(target["supplier"], json!("Acme"));
    }

    #[test]
    fn merge_adds_new_fields() {
        let mut target = Document::new();
        merge_into(&mut target, doc(json!({ "price": 1.5 })));
        assert_eq!(target["price"], json!(1.5));
    }

    #[tokio::test]
    async fn default_keys_follow_list() {
        let store = ListOnly::default();
        let scope = Scope::new("u1").unwrap();
        store
            .put(&scope, "b", doc(json!({})), WriteMode::Replace)
            .await
            .unwrap();
        store
            .put(&scope, "a", doc(json!({})), WriteMode::Replace)
            .await
            .unwrap();

        assert_eq!(store.keys(&scope).await.unwrap(), vec!["a", "b"]);
    }
}
