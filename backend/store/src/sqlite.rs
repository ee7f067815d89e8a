/// SQLite-backed warehouse store.
///
/// Two tables: `scanned_items` (the review log) and `inventory_items`
/// (approved stock). Timestamps are stored as RFC 3339 UTC text with
/// microsecond precision, so lexical order matches time order.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info};

use robowarehouse_core::{
    InventoryGroup, InventoryItem, NewScan, ScanStatus, ScannedItem, WarehouseError,
};

use crate::store::WarehouseStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS scanned_items (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        label       TEXT,
        confidence  REAL,
        raw_text    TEXT,
        image_path  TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'in_progress',
        created_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_scanned_items_status ON scanned_items(status);
    CREATE INDEX IF NOT EXISTS idx_scanned_items_created ON scanned_items(created_at);
    CREATE TABLE IF NOT EXISTS inventory_items (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        source_scan_id  INTEGER,
        label           TEXT,
        confidence      REAL,
        raw_text        TEXT,
        image_path      TEXT,
        created_at      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_inventory_items_label ON inventory_items(label);
    CREATE INDEX IF NOT EXISTS idx_inventory_items_created ON inventory_items(created_at);";

const SCAN_COLUMNS: &str = "id, label, confidence, raw_text, image_path, status, created_at";
const INVENTORY_COLUMNS: &str =
    "id, source_scan_id, label, confidence, raw_text, image_path, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite warehouse database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL journal")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize warehouse schema")?;

        info!(path = %path.display(), "Warehouse store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl WarehouseStore for SqliteStore {
    async fn create_scan(&self, scan: NewScan) -> Result<ScannedItem> {
        let conn = self.conn.lock().await;
        let created_at = Utc::now().trunc_subsecs(6);
        conn.execute(
            "INSERT INTO scanned_items (label, confidence, raw_text, image_path, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                scan.label,
                scan.confidence,
                scan.raw_text,
                scan.image_path,
                ScanStatus::InProgress.as_str(),
                format_ts(&created_at),
            ],
        )
        .map_err(storage)?;
        let id = conn.last_insert_rowid();
        debug!(scan_id = id, "Inserted scan");

        Ok(ScannedItem {
            id,
            label: scan.label,
            confidence: scan.confidence,
            raw_text: scan.raw_text,
            image_path: scan.image_path,
            status: ScanStatus::InProgress,
            created_at,
        })
    }

    async fn list_scans(&self) -> Result<Vec<ScannedItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCAN_COLUMNS} FROM scanned_items ORDER BY created_at DESC, id DESC"
        ))
        .map_err(storage)?;
        let scans = stmt
            .query_map([], row_to_scan)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(scans)
    }

    async fn get_scan(&self, id: i64) -> Result<Option<ScannedItem>> {
        let conn = self.conn.lock().await;
        let scan = conn
            .query_row(
                &format!("SELECT {SCAN_COLUMNS} FROM scanned_items WHERE id = ?1"),
                params![id],
                row_to_scan,
            )
            .optional()
            .map_err(storage)?;
        Ok(scan)
    }

    async fn approve_scan(&self, id: i64) -> Result<ScannedItem> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(storage)?;

        let mut scan = tx
            .query_row(
                &format!("SELECT {SCAN_COLUMNS} FROM scanned_items WHERE id = ?1"),
                params![id],
                row_to_scan,
            )
            .optional()
            .map_err(storage)?
            .ok_or(WarehouseError::ScanNotFound(id))?;

        tx.execute(
            "UPDATE scanned_items SET status = ?1 WHERE id = ?2",
            params![ScanStatus::Completed.as_str(), id],
        )
        .map_err(storage)?;
        tx.execute(
            "INSERT INTO inventory_items (source_scan_id, label, confidence, raw_text, image_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                scan.label,
                scan.confidence,
                scan.raw_text,
                scan.image_path,
                format_ts(&Utc::now()),
            ],
        )
        .map_err(storage)?;
        let inventory_id = tx.last_insert_rowid();
        tx.commit().map_err(storage)?;

        info!(scan_id = id, inventory_id, label = ?scan.label, "Scan approved into inventory");
        scan.status = ScanStatus::Completed;
        Ok(scan)
    }

    async fn clear_completed(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM scanned_items WHERE status = ?1",
            params![ScanStatus::Completed.as_str()],
        )
        .map_err(storage)?;
        info!(deleted, "Cleared completed scans");
        Ok(deleted as u64)
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_items ORDER BY created_at DESC, id DESC"
        ))
        .map_err(storage)?;
        let items = stmt
            .query_map([], row_to_inventory)
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;
        Ok(items)
    }

    async fn inventory_grouped(&self) -> Result<Vec<InventoryGroup>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT label, COUNT(id), AVG(confidence), MAX(created_at)
             FROM inventory_items GROUP BY label ORDER BY label ASC",
        )
        .map_err(storage)?;
        let rows = stmt
            .query_map([], |row| {
                let label: Option<String> = row.get(0)?;
                let count: i64 = row.get(1)?;
                let avg_confidence: Option<f64> = row.get(2)?;
                let latest: Option<String> = row.get(3)?;
                Ok((label, count, avg_confidence, latest))
            })
            .map_err(storage)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage)?;

        // `IS` matches the NULL-label group too.
        let mut latest_image = conn.prepare(
            "SELECT image_path FROM inventory_items WHERE label IS ?1
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .map_err(storage)?;

        let mut groups = Vec::with_capacity(rows.len());
        for (label, count, avg_confidence, latest) in rows {
            let latest_image_path: Option<String> = latest_image
                .query_row(params![label], |row| row.get::<_, Option<String>>(0))
                .optional()
                .map_err(storage)?
                .flatten();
            let latest_created_at = latest.as_deref().map(parse_ts).transpose()?;
            groups.push(InventoryGroup {
                label,
                count: count.max(0) as u64,
                avg_confidence,
                latest_created_at,
                latest_image_path,
            });
        }
        Ok(groups)
    }
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, WarehouseError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| WarehouseError::Storage(format!("invalid stored timestamp {raw}: {e}")))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Query failures surface as [`WarehouseError::Storage`].
fn storage(err: rusqlite::Error) -> WarehouseError {
    WarehouseError::Storage(err.to_string())
}

fn ts_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_scan(row: &rusqlite::Row) -> rusqlite::Result<ScannedItem> {
    let status: String = row.get(5)?;
    let status = status.parse::<ScanStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
    })?;

    Ok(ScannedItem {
        id: row.get(0)?,
        label: row.get(1)?,
        confidence: row.get(2)?,
        raw_text: row.get(3)?,
        image_path: row.get(4)?,
        status,
        created_at: ts_column(row, 6)?,
    })
}

fn row_to_inventory(row: &rusqlite::Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get(0)?,
        source_scan_id: row.get(1)?,
        label: row.get(2)?,
        confidence: row.get(3)?,
        raw_text: row.get(4)?,
        image_path: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_scan(label: Option<&str>, confidence: f64, image: &str) -> NewScan {
        NewScan {
            label: label.map(String::from),
            confidence: Some(confidence),
            raw_text: label.map(|l| format!("{l}, noise")),
            image_path: format!("/srv/uploads/{image}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store.create_scan(new_scan(Some("a"), 91.0, "a.png")).await.unwrap();
        let second = store.create_scan(new_scan(Some("b"), 55.0, "b.png")).await.unwrap();
        assert_eq!(first.status, ScanStatus::InProgress);

        let scans = store.list_scans().await.unwrap();
        let ids: Vec<i64> = scans.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(scans[1], first);
    }

    #[tokio::test]
    async fn test_unlabeled_scan_round_trips_nulls() {
        let store = SqliteStore::in_memory().unwrap();
        let scan = store
            .create_scan(NewScan {
                label: None,
                confidence: Some(0.0),
                raw_text: None,
                image_path: "/srv/uploads/blank.png".into(),
            })
            .await
            .unwrap();

        let fetched = store.get_scan(scan.id).await.unwrap().unwrap();
        assert_eq!(fetched.label, None);
        assert_eq!(fetched.raw_text, None);
        assert_eq!(fetched.confidence, Some(0.0));
    }

    #[tokio::test]
    async fn test_approve_copies_scan_into_inventory() {
        let store = SqliteStore::in_memory().unwrap();
        let scan = store.create_scan(new_scan(Some("c"), 92.0, "c.png")).await.unwrap();

        let approved = store.approve_scan(scan.id).await.unwrap();
        assert_eq!(approved.status, ScanStatus::Completed);
        assert_eq!(
            store.get_scan(scan.id).await.unwrap().unwrap().status,
            ScanStatus::Completed
        );

        let inventory = store.list_inventory().await.unwrap();
        assert_eq!(inventory.len(), 1);
        let item = &inventory[0];
        assert_eq!(item.source_scan_id, Some(scan.id));
        assert_eq!(item.label.as_deref(), Some("c"));
        assert_eq!(item.confidence, Some(92.0));
        assert_eq!(item.raw_text.as_deref(), Some("c, noise"));
        assert_eq!(item.image_path.as_deref(), Some("/srv/uploads/c.png"));
    }

    #[tokio::test]
    async fn test_approve_unknown_scan_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.approve_scan(404).await.unwrap_err();
        assert!(matches!(
            WarehouseError::from_anyhow(err),
            WarehouseError::ScanNotFound(404)
        ));
        assert!(store.list_inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reapproval_adds_another_inventory_row() {
        let store = SqliteStore::in_memory().unwrap();
        let scan = store.create_scan(new_scan(Some("d"), 60.0, "d.png")).await.unwrap();
        store.approve_scan(scan.id).await.unwrap();
        store.approve_scan(scan.id).await.unwrap();
        assert_eq!(store.list_inventory().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_completed_keeps_pending_and_inventory() {
        let store = SqliteStore::in_memory().unwrap();
        let done = store.create_scan(new_scan(Some("e"), 80.0, "e.png")).await.unwrap();
        let pending = store.create_scan(new_scan(Some("f"), 70.0, "f.png")).await.unwrap();
        store.approve_scan(done.id).await.unwrap();

        assert_eq!(store.clear_completed().await.unwrap(), 1);
        assert_eq!(store.clear_completed().await.unwrap(), 0);

        let scans = store.list_scans().await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].id, pending.id);

        let inventory = store.list_inventory().await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].source_scan_id, Some(done.id));
    }

    #[tokio::test]
    async fn test_grouped_aggregates_per_label() {
        let store = SqliteStore::in_memory().unwrap();
        for (label, conf, image) in [
            (Some("a"), 90.0, "a1.png"),
            (Some("b"), 40.0, "b1.png"),
            (Some("a"), 70.0, "a2.png"),
            (None, 0.0, "blank.png"),
        ] {
            let scan = store.create_scan(new_scan(label, conf, image)).await.unwrap();
            store.approve_scan(scan.id).await.unwrap();
        }

        let groups = store.inventory_grouped().await.unwrap();
        let labels: Vec<Option<&str>> = groups.iter().map(|g| g.label.as_deref()).collect();
        assert_eq!(labels, vec![None, Some("a"), Some("b")]);

        let a = &groups[1];
        assert_eq!(a.count, 2);
        assert!((a.avg_confidence.unwrap() - 80.0).abs() < 1e-9);
        assert_eq!(a.latest_image_path.as_deref(), Some("/srv/uploads/a2.png"));
        assert!(a.latest_created_at.is_some());

        let unlabeled = &groups[0];
        assert_eq!(unlabeled.count, 1);
        assert_eq!(
            unlabeled.latest_image_path.as_deref(),
            Some("/srv/uploads/blank.png")
        );
    }

    #[tokio::test]
    async fn test_grouped_on_empty_inventory() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.inventory_grouped().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("warehouse.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_scan(new_scan(Some("g"), 50.0, "g.png")).await.unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        let scans = reopened.list_scans().await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].label.as_deref(), Some("g"));
    }

    #[tokio::test]
    async fn test_query_failures_are_storage_errors() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .lock()
            .await
            .execute_batch("DROP TABLE inventory_items")
            .unwrap();

        let err = store.list_inventory().await.unwrap_err();
        match WarehouseError::from_anyhow(err) {
            WarehouseError::Storage(message) => assert!(message.contains("inventory_items")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
