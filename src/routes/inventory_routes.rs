use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use crate::errors::StorageError;
use crate::persistence::SharedAdapter;
use crate::state::Snapshot;

/// Build all snapshot routes under /inventory
pub fn routes(adapter: SharedAdapter) -> Router {
    Router::new()
        .route(
            "/:key",
            get(get_snapshot)
                .put(put_snapshot)
                .delete(delete_snapshot),
        )
        .route("/", delete(clear_all))
        .with_state(adapter)
}

fn internal(e: StorageError) -> StatusCode {
    tracing::warn!("Storage backend failed: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

//
// ─────────────────────────────────────────────────────────────
// PUT /inventory/{key}
// Store a snapshot, replacing any previous one
// ─────────────────────────────────────────────────────────────
//
async fn put_snapshot(
    Path(key): Path<String>,
    State(adapter): State<SharedAdapter>,
    Json(snapshot): Json<Snapshot>,
) -> Result<StatusCode, StatusCode>
{
    adapter.save(&key, &snapshot).await.map_err(internal)?;
    tracing::debug!("Stored {key}: {} items", snapshot.items.len());
    Ok(StatusCode::OK)
}

//
// ─────────────────────────────────────────────────────────────
// GET /inventory/{key}
// Return the snapshot or 404
// ─────────────────────────────────────────────────────────────
//
async fn get_snapshot(
    Path(key): Path<String>,
    State(adapter): State<SharedAdapter>,
) -> Result<Json<Snapshot>, StatusCode>
{
    match adapter.load(&key).await.map_err(internal)? {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /inventory/{key}
// Remove a snapshot; absent or unreadable entries are dropped too
// ─────────────────────────────────────────────────────────────
//
async fn delete_snapshot(
    Path(key): Path<String>,
    State(adapter): State<SharedAdapter>,
) -> StatusCode
{
    match adapter.remove(&key).await {
        Ok(()) => StatusCode::OK,
        Err(e) => internal(e),
    }
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /inventory
// Drop every stored snapshot (destructive)
// ─────────────────────────────────────────────────────────────
//
async fn clear_all(
    State(adapter): State<SharedAdapter>,
) -> StatusCode
{
    match adapter.clear().await {
        Ok(()) => {
            tracing::info!("Cleared all stored snapshots");
            StatusCode::OK
        }
        Err(e) => internal(e),
    }
}
