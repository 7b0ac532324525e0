//! Shared types for stockroom
//!
//! The inventory record, the user scope it lives under, the numeric
//! coercions applied to user and CSV input, and the contract every
//! record store backend implements.

pub mod coerce;
pub mod error;
pub mod item;
pub mod store;

pub use coerce::{parse_price, parse_quantity, QuantityDefault};
pub use error::{StoreError, StoreResult};
pub use item::{format_number, Document, InventoryItem, ItemDraft, Scope};
pub use store::{merge_into, RecordStore, WriteMode};
