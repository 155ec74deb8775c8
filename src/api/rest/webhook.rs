//! Webhook endpoint - event ingestion from devices

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};

use super::ApiError;
use crate::api::state::AppState;
use crate::handlers::{self, IngestReceipt, IngestRequest};
use crate::types::EventCandidate;

/// Multipart field carrying the image
pub const SCREENSHOT_FIELD: &str = "screenshot";

/// An uploaded file held in memory until the payload is validated
struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

/// POST /webhook - Receive an event
///
/// Accepts a JSON body, an urlencoded form, or multipart form data with an
/// optional `screenshot` file. In form variants a JSON-encoded event may be
/// sent in the `event` field. The screenshot is written only after the
/// payload has been validated.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<IngestReceipt>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let (ingest_request, upload) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        read_multipart(multipart).await?
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        (IngestRequest::from_form_fields(pairs), None)
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        (IngestRequest::Json(parse_json_body(&body)?), None)
    };

    let candidate = handlers::normalize(ingest_request)?;

    // The image and snapshot writes fsync, keep them off the async workers
    let receipt = tokio::task::spawn_blocking(move || store_event(&state, candidate, upload))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Ingestion task failed");
            ApiError::internal("ingestion task failed")
        })??;
    Ok(Json(receipt))
}

/// Write the screenshot, if any, then insert the event
fn store_event(
    state: &AppState,
    candidate: EventCandidate,
    upload: Option<Upload>,
) -> Result<IngestReceipt, ApiError> {
    let screenshot = match upload {
        Some(upload) => {
            let reference = state
                .attachments
                .save(upload.file_name.as_deref(), &upload.bytes)
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to store screenshot");
                    ApiError::internal("failed to store screenshot")
                })?;
            Some(reference)
        }
        None => None,
    };

    Ok(handlers::submit(&state.store, candidate.with_screenshot(screenshot))?)
}

/// An empty body is an event without fields
fn parse_json_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Malformed event: invalid JSON: {}", e)))
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(IngestRequest, Option<Upload>), ApiError> {
    let mut pairs = Vec::new();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == SCREENSHOT_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            // Browsers send an empty part when no file was picked
            if !bytes.is_empty() || file_name.as_deref().is_some_and(|n| !n.is_empty()) {
                upload = Some(Upload { file_name, bytes });
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            pairs.push((name, text));
        }
    }

    Ok((IngestRequest::from_form_fields(pairs), upload))
}
