pub mod detection;
pub mod error;
pub mod traits;
pub mod types;

pub use detection::{BoundingBox, Detection, LabelResult};
pub use error::WarehouseError;
pub use traits::OcrEngine;
pub use types::{InventoryGroup, InventoryItem, NewScan, ScanStatus, ScannedItem};
