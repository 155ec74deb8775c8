//! Event log endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::ApiError;
use crate::api::state::AppState;
use crate::handlers::{self, ClearReceipt, TypeCount};
use crate::types::Event;

/// GET /events - All events, newest first
pub async fn list_events(State(state): State<Arc<AppState>>) -> Json<Vec<Event>> {
    Json(handlers::list_all(&state.store))
}

/// GET /events/type/:event_type - Events of one type, newest first
pub async fn list_events_by_type(
    State(state): State<Arc<AppState>>,
    Path(event_type): Path<String>,
) -> Json<Vec<Event>> {
    Json(handlers::list_by_type(&state.store, &event_type))
}

/// DELETE /events - Clear the log
pub async fn clear_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearReceipt>, ApiError> {
    let receipt = tokio::task::spawn_blocking(move || handlers::clear_all(&state.store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Clear task failed");
            ApiError::internal("clear task failed")
        })??;
    Ok(Json(receipt))
}

/// Response for GET /events/stats
#[derive(Debug, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub capacity: usize,
    pub types: Vec<TypeCount>,
}

/// GET /events/stats - Per-type counts
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<EventStats> {
    let types = handlers::type_counts(&state.store);
    let status = handlers::status(&state.store);

    Json(EventStats {
        total: types.iter().map(|t| t.count).sum(),
        capacity: status.capacity,
        types,
    })
}
