use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review lifecycle of an uploaded scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Uploaded and recognized, waiting for an operator
    #[default]
    InProgress,
    /// Approved and copied into inventory
    Completed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::InProgress => "in_progress",
            ScanStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ScanStatus::InProgress),
            "completed" => Ok(ScanStatus::Completed),
            other => Err(format!("unknown scan status: {other}")),
        }
    }
}

/// A pending or reviewed upload in the scans log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannedItem {
    pub id: i64,
    pub label: Option<String>,
    /// Percentage, 0..=100
    pub confidence: Option<f64>,
    /// Comma-joined text of every OCR detection
    pub raw_text: Option<String>,
    /// Server-side path of the stored image
    pub image_path: String,
    pub status: ScanStatus,
    pub created_at: DateTime<Utc>,
}

/// Insertion payload for a new scan. New scans always start `in_progress`.
#[derive(Debug, Clone, Default)]
pub struct NewScan {
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub raw_text: Option<String>,
    pub image_path: String,
}

/// A permanent inventory record, created only by approving a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: i64,
    /// Scan this row was copied from. May dangle once completed scans are cleared.
    pub source_scan_id: Option<i64>,
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub raw_text: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Inventory aggregated per distinct label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryGroup {
    pub label: Option<String>,
    pub count: u64,
    pub avg_confidence: Option<f64>,
    pub latest_created_at: Option<DateTime<Utc>>,
    pub latest_image_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ScanStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ScanStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, ScanStatus::Completed);
    }

    #[test]
    fn status_display_matches_storage_form() {
        assert_eq!(ScanStatus::InProgress.to_string(), "in_progress");
        assert_eq!("completed".parse::<ScanStatus>().unwrap(), ScanStatus::Completed);
        assert!("done".parse::<ScanStatus>().is_err());
    }
}
