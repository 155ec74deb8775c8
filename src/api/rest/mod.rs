//! REST API module for HTTP endpoints
//!
//! - `POST /webhook` - Ingest an event (JSON, urlencoded form or multipart)
//! - `GET /events` - All events, newest first
//! - `GET /events/type/:type` - Events of one type
//! - `GET /events/stats` - Per-type counts
//! - `DELETE /events` - Clear the log

pub mod events;
pub mod webhook;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::event_store::EventStoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let code = match status {
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            s if s.is_client_error() => "CLIENT_ERROR",
            _ => "INTERNAL_ERROR",
        };
        Self {
            status,
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<EventStoreError> for ApiError {
    fn from(e: EventStoreError) -> Self {
        if e.is_client_error() {
            return ApiError::bad_request(e.to_string());
        }
        tracing::error!(error = %e, "Event log operation failed");
        ApiError::internal("event log operation failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_malformed_event_is_bad_request() {
        let err: ApiError = EventStoreError::malformed("invalid JSON").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "BAD_REQUEST");
        assert_eq!(err.error, "Malformed event: invalid JSON");
    }

    #[test]
    fn test_write_failure_is_internal() {
        let err: ApiError = EventStoreError::PersistenceWriteFailure(io::Error::new(
            io::ErrorKind::Other,
            "disk full",
        ))
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "INTERNAL_ERROR");
        // Server details stay in the logs
        assert!(!err.error.contains("disk full"));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "too big")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "too big", "code": "PAYLOAD_TOO_LARGE"}));
    }
}
