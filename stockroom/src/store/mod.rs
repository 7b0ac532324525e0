//! Record store backends

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{init_schema, SqliteStore};
