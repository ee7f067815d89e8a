//! Durable storage for scans awaiting review and approved inventory.

pub mod sqlite;
pub mod store;

pub use sqlite::SqliteStore;
pub use store::WarehouseStore;
