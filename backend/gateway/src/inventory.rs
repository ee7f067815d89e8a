//! Inventory endpoints (approved stock).

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::error::ApiError;
use crate::server::AppState;
use crate::views::{InventoryGroupOut, InventoryItemOut};

/// GET /inventory: every approved item, newest first.
pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InventoryItemOut>>, ApiError> {
    let items = state.store.list_inventory().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// GET /inventory/grouped: one row per label with count, average
/// confidence, and the latest image/time.
pub async fn inventory_grouped(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InventoryGroupOut>>, ApiError> {
    let groups = state.store.inventory_grouped().await?;
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}
