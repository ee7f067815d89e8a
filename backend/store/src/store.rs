use anyhow::Result;
use async_trait::async_trait;

use robowarehouse_core::{InventoryGroup, InventoryItem, NewScan, ScannedItem};

/// Abstract interface over the scans log and the inventory.
///
/// Errors that callers are expected to branch on (e.g. an unknown scan id)
/// are raised as [`robowarehouse_core::WarehouseError`] wrapped in `anyhow`.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Record a freshly recognized upload as `in_progress`.
    async fn create_scan(&self, scan: NewScan) -> Result<ScannedItem>;

    /// All scans, newest first.
    async fn list_scans(&self) -> Result<Vec<ScannedItem>>;

    /// Fetch one scan by id.
    async fn get_scan(&self, id: i64) -> Result<Option<ScannedItem>>;

    /// Mark a scan completed and copy it into inventory, atomically.
    async fn approve_scan(&self, id: i64) -> Result<ScannedItem>;

    /// Delete every completed scan from the log. Inventory is untouched.
    async fn clear_completed(&self) -> Result<u64>;

    /// All inventory rows, newest first.
    async fn list_inventory(&self) -> Result<Vec<InventoryItem>>;

    /// One row per distinct label.
    async fn inventory_grouped(&self) -> Result<Vec<InventoryGroup>>;
}
