//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::rest::{events, webhook};
use super::state::AppState;
use crate::attachments::PUBLIC_PREFIX;
use crate::handlers;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Devices and dashboards post from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let images = ServeDir::new(state.attachments.dir());

    Router::new()
        .route("/", get(server_status))
        .route("/health", get(health_check))
        .route("/webhook", post(webhook::receive_event))
        .route(
            "/events",
            get(events::list_events).delete(events::clear_events),
        )
        .route("/events/stats", get(events::get_stats))
        .route("/events/type/:event_type", get(events::list_events_by_type))
        .nest_service(PUBLIC_PREFIX, images)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// GET / - Server status and endpoint listing
async fn server_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = handlers::status(&state.store);
    Json(json!({
        "status": "running",
        "eventsCount": status.events_count,
        "capacity": status.capacity,
        "endpoints": {
            "POST /webhook": "Send events from the drone",
            "GET /events": "Get all events",
            "GET /events/type/:type": "Get events by type",
            "GET /events/stats": "Get event counts by type",
            "DELETE /events": "Clear all events"
        }
    }))
}
