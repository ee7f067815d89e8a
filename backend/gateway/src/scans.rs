//! Scan log endpoints: upload + recognize, list, approve, clear.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;

use robowarehouse_core::{NewScan, WarehouseError};
use robowarehouse_vision::decode_upload;

use crate::error::ApiError;
use crate::server::AppState;
use crate::uploads::store_image;
use crate::views::ScannedItemOut;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ClearCompletedOut {
    pub deleted: u64,
}

/// POST /scans: upload an image, run OCR, create an `in_progress` scan.
pub async fn create_scan(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ScannedItemOut>, ApiError> {
    let (file_name, bytes) = read_file_field(&mut multipart, state.max_upload_bytes).await?;

    let normalized = tokio::task::spawn_blocking(move || decode_upload(&bytes))
        .await
        .map_err(|e| WarehouseError::Other(anyhow::anyhow!("decode task failed: {e}")))??;

    let recognition = state.recognizer.recognize(&normalized.png_bytes).await?;
    let image_path = store_image(&state.upload_dir, file_name.as_deref(), &normalized.png_bytes).await?;

    let scan = state
        .store
        .create_scan(NewScan {
            label: recognition.result.label,
            confidence: Some(recognition.result.confidence_percent),
            raw_text: recognition.raw_text,
            image_path: image_path.display().to_string(),
        })
        .await?;

    info!(
        scan_id = scan.id,
        label = ?scan.label,
        confidence = ?scan.confidence,
        width = normalized.width,
        height = normalized.height,
        "Scan created"
    );
    Ok(Json(scan.into()))
}

/// GET /scans: every scan, newest first.
pub async fn list_scans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ScannedItemOut>>, ApiError> {
    let scans = state.store.list_scans().await?;
    Ok(Json(scans.into_iter().map(Into::into).collect()))
}

/// POST /scans/:id/approve: mark completed and copy into inventory.
pub async fn approve_scan(
    State(state): State<Arc<AppState>>,
    Path(scan_id): Path<i64>,
) -> Result<Json<ScannedItemOut>, ApiError> {
    let scan = state.store.approve_scan(scan_id).await?;
    Ok(Json(scan.into()))
}

/// POST /scans/clear_completed: drop completed scans from the log only.
///
/// Image files stay on disk; inventory rows may still reference them.
pub async fn clear_completed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearCompletedOut>, ApiError> {
    let deleted = state.store.clear_completed().await?;
    Ok(Json(ClearCompletedOut { deleted }))
}

async fn read_file_field(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<(Option<String>, Bytes), WarehouseError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok((file_name, bytes));
    }
    Err(WarehouseError::BadRequest(format!(
        "multipart field `{FILE_FIELD}` is required"
    )))
}

fn multipart_error(err: MultipartError, limit: usize) -> WarehouseError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WarehouseError::PayloadTooLarge { limit }
    } else {
        WarehouseError::BadRequest(err.body_text())
    }
}
