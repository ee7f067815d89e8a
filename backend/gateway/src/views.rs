//! Public JSON representations of stored records.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use robowarehouse_core::{InventoryGroup, InventoryItem, ScanStatus, ScannedItem};

/// Mount point for stored images.
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannedItemOut {
    pub id: i64,
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub raw_text: Option<String>,
    pub image_url: Option<String>,
    pub status: ScanStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItemOut {
    pub id: i64,
    pub source_scan_id: Option<i64>,
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub raw_text: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryGroupOut {
    pub label: Option<String>,
    pub count: u64,
    pub latest_image_url: Option<String>,
    pub latest_created_at: Option<String>,
    pub avg_confidence: Option<f64>,
}

/// Map a server-side image path to its public URL under [`UPLOADS_PREFIX`].
pub fn public_url(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let name = Path::new(path).file_name()?.to_str()?;
    Some(format!("{UPLOADS_PREFIX}/{name}"))
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl From<ScannedItem> for ScannedItemOut {
    fn from(item: ScannedItem) -> Self {
        Self {
            id: item.id,
            image_url: public_url(&item.image_path),
            label: item.label,
            confidence: item.confidence,
            raw_text: item.raw_text,
            status: item.status,
            created_at: timestamp(&item.created_at),
        }
    }
}

impl From<InventoryItem> for InventoryItemOut {
    fn from(item: InventoryItem) -> Self {
        Self {
            id: item.id,
            source_scan_id: item.source_scan_id,
            image_url: item.image_path.as_deref().and_then(public_url),
            label: item.label,
            confidence: item.confidence,
            raw_text: item.raw_text,
            created_at: timestamp(&item.created_at),
        }
    }
}

impl From<InventoryGroup> for InventoryGroupOut {
    fn from(group: InventoryGroup) -> Self {
        Self {
            latest_image_url: group.latest_image_path.as_deref().and_then(public_url),
            latest_created_at: group.latest_created_at.as_ref().map(timestamp),
            label: group.label,
            count: group.count,
            avg_confidence: group.avg_confidence,
        }
    }
}
