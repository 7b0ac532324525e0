//! Single-record mutations
//!
//! Every operation needs a signed-in scope, writes to the store, then
//! refreshes the snapshot and returns it. Each record write is durable on
//! its own; there is no rollback across the two steps of a rename.

use crate::error::{LedgerError, Result};
use crate::repository::{DecrementPolicy, Repository};
use serde_json::Value;
use stockroom_common::{
    InventoryItem, ItemDraft, QuantityDefault, Scope, StoreError, WriteMode,
};

fn store_failure(operation: &'static str, key: &str) -> impl FnOnce(StoreError) -> LedgerError {
    let key = key.to_string();
    move |e| {
        log::error!("Error during {} of '{}': {}", operation, key, e);
        LedgerError::StoreUnavailable(e)
    }
}

fn require_name(name: &str, operation: &str) -> Result<()> {
    if name.is_empty() {
        log::error!("Cannot {}: item name is empty", operation);
        return Err(LedgerError::InvalidInput("item name is empty".to_string()));
    }
    Ok(())
}

impl Repository {
    /// Writes a new record, replacing whatever is stored under the name.
    ///
    /// Unusable quantity input becomes 1.
    pub async fn add(&mut self, draft: &ItemDraft) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("add item")?;
        require_name(&draft.name, "add item")?;

        let item = draft.coerce(QuantityDefault::NewItem);
        self.store()
            .put(&scope, &item.name, item.to_document(), WriteMode::Replace)
            .await
            .map_err(store_failure("add", &item.name))?;

        log::info!("Added '{}' (quantity {})", item.name, item.quantity);
        self.refresh().await
    }

    /// Adds one to the quantity shown in `item` and merge-writes the record.
    pub async fn increment(&mut self, item: &InventoryItem) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("increment item")?;
        require_name(&item.name, "increment item")?;

        let mut doc = item.to_document();
        doc.insert(
            "quantity".to_string(),
            Value::from(item.quantity.saturating_add(1)),
        );
        self.store()
            .put(&scope, &item.name, doc, WriteMode::Merge)
            .await
            .map_err(store_failure("increment", &item.name))?;

        log::info!("Incremented '{}'", item.name);
        self.refresh().await
    }

    /// Takes one off the stored quantity.
    ///
    /// Reads the stored record rather than the snapshot. A missing record
    /// is left alone. Under `DecrementPolicy::RemoveAtZero` a record at
    /// quantity 1 or below is deleted instead.
    pub async fn decrement(&mut self, name: &str) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("decrement item")?;
        require_name(name, "decrement item")?;

        let current = self
            .store()
            .get(&scope, name)
            .await
            .map_err(store_failure("decrement", name))?;

        match current {
            Some(mut doc) => {
                let quantity = InventoryItem::from_document(name, &doc).quantity;
                match self.policy() {
                    DecrementPolicy::RemoveAtZero if quantity <= 1 => {
                        self.store()
                            .delete(&scope, name)
                            .await
                            .map_err(store_failure("decrement", name))?;
                        log::info!("Removed '{}' at zero", name);
                    }
                    _ => {
                        let next = quantity.saturating_sub(1);
                        doc.insert("quantity".to_string(), Value::from(next));
                        self.store()
                            .put(&scope, name, doc, WriteMode::Merge)
                            .await
                            .map_err(store_failure("decrement", name))?;
                        log::info!("Decremented '{}' to {}", name, next);
                    }
                }
            }
            None => log::debug!("Decrement of missing item '{}' ignored", name),
        }

        self.refresh().await
    }

    /// Saves an edited record, renaming it when the draft's name differs.
    ///
    /// A rename deletes the old key before writing the new one. If the
    /// write fails after the delete succeeded, the record is gone.
    /// Unusable quantity input becomes 0.
    pub async fn edit(&mut self, original_name: &str, draft: &ItemDraft) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("update item")?;
        require_name(&draft.name, "update item")?;

        let item = draft.coerce(QuantityDefault::Edit);
        let renamed = item.name != original_name;
        if renamed {
            self.store()
                .delete(&scope, original_name)
                .await
                .map_err(store_failure("rename", original_name))?;
        }

        self.store()
            .put(&scope, &item.name, item.to_document(), WriteMode::Replace)
            .await
            .map_err(|e| {
                if renamed {
                    log::warn!(
                        "'{}' was deleted but '{}' could not be written",
                        original_name,
                        item.name
                    );
                }
                store_failure("update", &item.name)(e)
            })?;

        if renamed {
            log::info!("Renamed '{}' to '{}'", original_name, item.name);
        } else {
            log::info!("Updated '{}'", item.name);
        }
        self.refresh().await
    }

    /// Removes the record unconditionally.
    pub async fn delete(&mut self, name: &str) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("delete item")?;
        require_name(name, "delete item")?;

        self.store()
            .delete(&scope, name)
            .await
            .map_err(store_failure("delete", name))?;

        log::info!("Deleted '{}'", name);
        self.refresh().await
    }

    /// Counts one more of `name`: creates it at quantity 1 if missing,
    /// otherwise merge-writes the stored quantity plus one.
    pub async fn tally(&mut self, name: &str) -> Result<&[InventoryItem]> {
        let scope = self.require_scope("tally item")?;
        require_name(name, "tally item")?;

        self.tally_in(&scope, name).await?;
        self.refresh().await
    }

    async fn tally_in(&self, scope: &Scope, name: &str) -> Result<()> {
        let current = self
            .store()
            .get(scope, name)
            .await
            .map_err(store_failure("tally", name))?;

        let (doc, mode) = match current {
            Some(mut doc) => {
                let quantity = InventoryItem::from_document(name, &doc).quantity;
                doc.insert("quantity".to_string(), Value::from(quantity.saturating_add(1)));
                (doc, WriteMode::Merge)
            }
            None => {
                let mut item = InventoryItem::new(name);
                item.quantity = 1;
                (item.to_document(), WriteMode::Replace)
            }
        };

        self.store()
            .put(scope, name, doc, mode)
            .await
            .map_err(store_failure("tally", name))?;
        log::info!("Tallied '{}'", name);
        Ok(())
    }
}
