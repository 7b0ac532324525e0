//! The signed-in user's inventory
//!
//! A `Repository` holds the current scope and the last snapshot loaded
//! from the store. Mutations (see `mutation`) and imports (see
//! `reconcile`) write to the store first and then call `refresh`, so the
//! snapshot always reflects what the backend last returned rather than a
//! local patch.

use crate::error::{LedgerError, Result};
use std::sync::Arc;
use stockroom_common::{InventoryItem, RecordStore, Scope};

/// What decrementing an item at quantity 1 or 0 does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecrementPolicy {
    /// Quantity stops at 0; the record stays
    #[default]
    Clamp,
    /// Decrementing from 1 (or 0) deletes the record
    RemoveAtZero,
}

pub struct Repository {
    store: Arc<dyn RecordStore>,
    scope: Option<Scope>,
    items: Vec<InventoryItem>,
    policy: DecrementPolicy,
}

/// Fetches every record under `scope`, in store order.
///
/// An empty scope yields an empty list, not an error.
pub async fn load(store: &dyn RecordStore, scope: &Scope) -> Result<Vec<InventoryItem>> {
    let docs = store.list(scope).await.map_err(|e| {
        log::error!(
            "Failed to load {} from {} store: {}",
            scope.collection_path(),
            store.backend_tag(),
            e
        );
        LedgerError::StoreUnavailable(e)
    })?;

    Ok(docs
        .iter()
        .map(|(key, doc)| InventoryItem::from_document(key, doc))
        .collect())
}

impl Repository {
    /// A signed-out repository with an empty snapshot
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            scope: None,
            items: Vec::new(),
            policy: DecrementPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DecrementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Switches to `scope` and loads its records.
    pub async fn sign_in(&mut self, scope: Scope) -> Result<&[InventoryItem]> {
        if self.scope.as_ref() != Some(&scope) {
            self.items.clear();
        }
        log::info!("Signed in as {}", scope);
        self.scope = Some(scope);
        self.refresh().await
    }

    /// Drops the scope and every item held for it.
    pub fn sign_out(&mut self) {
        if let Some(scope) = self.scope.take() {
            log::info!("Signed out {}", scope);
        }
        self.items.clear();
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn policy(&self) -> DecrementPolicy {
        self.policy
    }

    /// The last loaded snapshot
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Reloads the snapshot from the store.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh(&mut self) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("refresh")?;
        self.items = load(self.store.as_ref(), &scope).await?;
        log::debug!("Loaded {} item(s) for {}", self.items.len(), scope);
        Ok(&self.items)
    }

    pub(crate) fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub(crate) fn require_scope(&self, operation: &str) -> Result<Scope> {
        self.scope.clone().ok_or_else(|| {
            log::error!("Cannot {}: user is not signed in", operation);
            LedgerError::Unauthenticated
        })
    }
}
