//! Stockroom - per-user inventory ledger
//!
//! Keeps one user's items in a document store, applies single-record
//! mutations, and moves the whole inventory in and out as CSV text.

pub mod csv_text;
pub mod error;
pub mod mutation;
pub mod query;
pub mod reconcile;
pub mod repository;
pub mod store;
pub mod web;

pub use csv_text::{export_csv, parse_rows, write_export, ImportRow};
pub use error::{LedgerError, Result};
pub use query::{SortKey, NO_SUPPLIER};
pub use reconcile::{plan, ImportReport, ReconcilePlan};
pub use repository::{load, DecrementPolicy, Repository};
pub use store::{init_schema, MemoryStore, SqliteStore};
