//! CSV import by set reconciliation
//!
//! After an import the scope holds exactly the named rows of the CSV:
//! - every row with a name is written as a full record (never merged),
//! - rows with a blank name are skipped,
//! - every stored record whose name does not appear in the CSV is deleted.
//!
//! Writes are not transactional. A failing row is recorded and the rest of
//! the import carries on, so a failed import can leave the scope somewhere
//! between the old and the new dataset.

use crate::csv_text::{parse_rows, ImportRow};
use crate::error::{LedgerError, Result};
use crate::repository::Repository;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use stockroom_common::{InventoryItem, WriteMode};

/// Outcome of one import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Rows written under a name that did not exist before
    pub created: usize,
    /// Rows written over an existing record
    pub updated: usize,
    /// Stored records removed because the CSV did not name them
    pub deleted: usize,
    /// Rows skipped for a blank name
    pub skipped: usize,
    /// Keys whose write or delete failed
    pub failed: Vec<String>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A row to write, and whether its name was already stored
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpsert {
    pub item: InventoryItem,
    pub existed: bool,
}

/// Everything an import will do, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// In CSV order; a name repeated in the CSV is written once per row
    pub upserts: Vec<PlannedUpsert>,
    /// Stored keys not named by any row, in store order
    pub deletions: Vec<String>,
    pub skipped: usize,
}

/// Works out the upserts and deletions that make `current_keys` match `rows`.
pub fn plan(rows: &[ImportRow], current_keys: Vec<String>) -> ReconcilePlan {
    let mut unaccounted: HashSet<String> = current_keys.iter().cloned().collect();
    let mut known: HashSet<String> = unaccounted.clone();
    let mut result = ReconcilePlan::default();

    for row in rows {
        if row.name().is_empty() {
            result.skipped += 1;
            continue;
        }
        let item = row.to_item();
        let existed = !known.insert(item.name.clone());
        unaccounted.remove(&item.name);
        result.upserts.push(PlannedUpsert { item, existed });
    }

    result.deletions = current_keys
        .into_iter()
        .filter(|key| unaccounted.contains(key))
        .collect();
    result
}

impl Repository {
    /// Makes the signed-in scope match the CSV `text` exactly.
    ///
    /// Fails with `StoreUnavailable` before writing anything if the current
    /// keys cannot be listed, and with `PartialImportFailure` after a
    /// single refresh if any write or delete failed.
    pub async fn import_csv(&mut self, text: &str) -> Result<ImportReport> {
        let scope = self.require_scope("import")?;
        let rows = parse_rows(text);

        let current_keys = self.store().keys(&scope).await.map_err(|e| {
            log::error!("Import aborted, cannot list current items: {}", e);
            LedgerError::StoreUnavailable(e)
        })?;

        let plan = plan(&rows, current_keys);
        log::info!(
            "Importing {} row(s) into {}: {} to write, {} to delete, {} skipped",
            rows.len(),
            scope,
            plan.upserts.len(),
            plan.deletions.len(),
            plan.skipped
        );

        let mut report = ImportReport {
            skipped: plan.skipped,
            ..ImportReport::default()
        };

        for upsert in plan.upserts {
            let name = upsert.item.name.clone();
            match self
                .store()
                .put(&scope, &name, upsert.item.to_document(), WriteMode::Replace)
                .await
            {
                Ok(()) if upsert.existed => report.updated += 1,
                Ok(()) => report.created += 1,
                Err(e) => {
                    log::error!("Import failed to write '{}': {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        for key in plan.deletions {
            match self.store().delete(&scope, &key).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    log::error!("Import failed to delete '{}': {}", key, e);
                    report.failed.push(key);
                }
            }
        }

        self.refresh().await?;

        log::info!(
            "Import finished: {} created, {} updated, {} deleted, {} skipped, {} failed",
            report.created,
            report.updated,
            report.deleted,
            report.skipped,
            report.failed.len()
        );

        if report.is_clean() {
            Ok(report)
        } else {
            Err(LedgerError::PartialImportFailure(report))
        }
    }

    /// Reads a CSV file and imports it.
    pub async fn import_file(&mut self, path: &Path) -> Result<ImportReport> {
        self.require_scope("import")?;
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            log::error!("Cannot read import file {}: {}", path.display(), e);
            LedgerError::Io(e)
        })?;
        self.import_csv(&text).await
    }
}
