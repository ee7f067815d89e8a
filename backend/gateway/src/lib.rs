//! Warehouse intake HTTP API.
//!
//! Upload photos for label recognition, review the scan log, approve scans
//! into inventory, and serve stored images.

pub mod error;
pub mod inventory;
pub mod scans;
pub mod server;
pub mod uploads;
pub mod views;

pub use error::ApiError;
pub use server::{build_router, start_server, AppState, SERVICE_NAME};
pub use views::{InventoryGroupOut, InventoryItemOut, ScannedItemOut};
