//! API module for HTTP endpoints
//!
//! Thin axum layer over the event store: webhook ingestion, event queries
//! and static serving of uploaded screenshots.

pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
