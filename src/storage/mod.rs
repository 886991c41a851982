//! Storage layer for rategate - flat key-value persistence.
//!
//! The gate persists its bookkeeping through the `KeyValueStore` trait. Two
//! backends ship with the crate: a volatile `MemoryStore` and a `SqliteStore`
//! for hosts without a platform preferences store of their own.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{KeyValueStore, StoredValue};
