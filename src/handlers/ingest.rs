//! Ingestion: turn an incoming webhook payload into a stored event

use serde::Serialize;
use serde_json::{Map, Value};

use crate::event_store::{EventStore, EventStoreResult};
use crate::types::EventCandidate;

/// Name of the form field carrying a JSON-encoded event
pub const EVENT_FIELD: &str = "event";

/// A webhook payload before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum IngestRequest {
    /// A JSON object holding the event fields directly
    Json(Value),
    /// Form fields, optionally with a JSON-encoded event in `event`
    Form {
        event: Option<String>,
        fields: Map<String, Value>,
    },
}

impl IngestRequest {
    /// Build a form request from text fields, pulling out the `event` field
    pub fn from_form_fields<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut event = None;
        let mut fields = Map::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if key == EVENT_FIELD {
                event = Some(value);
            } else {
                fields.insert(key, Value::String(value));
            }
        }
        IngestRequest::Form { event, fields }
    }
}

/// Reply to a successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReceipt {
    pub success: bool,
    #[serde(rename = "eventId")]
    pub event_id: String,
}

/// Normalize a request into a candidate
///
/// Form fields are the base; fields of the decoded `event` blob override
/// them. An empty `event` field counts as absent.
pub fn normalize(request: IngestRequest) -> EventStoreResult<EventCandidate> {
    match request {
        IngestRequest::Json(value) => EventCandidate::from_value(value),
        IngestRequest::Form { event, mut fields } => {
            if let Some(text) = event.filter(|t| !t.trim().is_empty()) {
                let blob = EventCandidate::from_json_str(&text)?;
                if let Some(event_type) = blob.event_type {
                    fields.insert("type".to_string(), Value::String(event_type));
                }
                fields.extend(blob.fields);
            }
            EventCandidate::from_object(fields)
        }
    }
}

/// Validate, attach the media reference and store the event
pub fn ingest(
    store: &EventStore,
    request: IngestRequest,
    attachment: Option<String>,
) -> EventStoreResult<IngestReceipt> {
    let candidate = normalize(request)?.with_screenshot(attachment);
    submit(store, candidate)
}

/// Store an already normalized candidate
///
/// Used when the attachment can only be written after the payload has
/// been validated.
pub fn submit(store: &EventStore, candidate: EventCandidate) -> EventStoreResult<IngestReceipt> {
    let event = store.insert(candidate)?;

    tracing::info!(
        id = %event.id,
        event_type = event.event_type.as_deref().unwrap_or("-"),
        screenshot = event.screenshot.is_some(),
        "Event received"
    );

    Ok(IngestReceipt {
        success: true,
        event_id: event.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::{EventStoreError, MemorySnapshot};
    use serde_json::json;

    fn create_test_store() -> EventStore {
        EventStore::open_with(10, Box::new(MemorySnapshot::new())).unwrap()
    }

    #[test]
    fn test_ingest_json() {
        let store = create_test_store();
        let request = IngestRequest::Json(json!({
            "type": "takeoff",
            "data": {"battery": 90, "height": 0},
            "source": "tello_drone"
        }));

        let receipt = ingest(&store, request, None).unwrap();

        let stored = &store.all()[0];
        assert!(receipt.success);
        assert_eq!(receipt.event_id, stored.id);
        assert_eq!(stored.event_type.as_deref(), Some("takeoff"));
        assert_eq!(stored.payload["data"]["battery"], 90);
        assert_eq!(stored.payload["source"], "tello_drone");
        assert_eq!(stored.screenshot, None);
    }

    #[test]
    fn test_ingest_form_with_attachment() {
        let store = create_test_store();
        let request = IngestRequest::from_form_fields([
            ("event", r#"{"type": "face_lock", "person_name": "Ada"}"#),
            ("source", "camera"),
        ]);

        ingest(&store, request, Some("/event-images/1-face.jpg".to_string())).unwrap();

        let stored = &store.all()[0];
        assert_eq!(stored.event_type.as_deref(), Some("face_lock"));
        assert_eq!(stored.payload["person_name"], "Ada");
        assert_eq!(stored.payload["source"], "camera");
        assert_eq!(stored.screenshot.as_deref(), Some("/event-images/1-face.jpg"));
    }

    #[test]
    fn test_event_blob_overrides_form_fields() {
        let request = IngestRequest::from_form_fields([
            ("type", "from_form"),
            ("source", "form"),
            ("event", r#"{"type": "from_blob", "source": "blob"}"#),
        ]);

        let candidate = normalize(request).unwrap();

        assert_eq!(candidate.event_type.as_deref(), Some("from_blob"));
        assert_eq!(candidate.fields["source"], "blob");
    }

    #[test]
    fn test_form_without_event_blob() {
        let request = IngestRequest::from_form_fields([("type", "land"), ("flight_time", "42")]);

        let candidate = normalize(request).unwrap();

        assert_eq!(candidate.event_type.as_deref(), Some("land"));
        assert_eq!(candidate.fields["flight_time"], "42");
    }

    #[test]
    fn test_empty_event_field_is_absent() {
        let request = IngestRequest::from_form_fields([("event", " "), ("type", "land")]);

        let candidate = normalize(request).unwrap();
        assert_eq!(candidate.event_type.as_deref(), Some("land"));
    }

    #[test]
    fn test_malformed_event_blob_is_rejected() {
        let store = create_test_store();
        let request = IngestRequest::from_form_fields([("event", "{\"type\": ")]);

        let err = ingest(&store, request, Some("/event-images/x.png".to_string())).unwrap_err();

        assert!(matches!(err, EventStoreError::MalformedEvent(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        let store = create_test_store();

        let err = ingest(&store, IngestRequest::Json(json!("motion")), None).unwrap_err();

        assert!(err.is_client_error());
        assert!(store.is_empty());
    }

    #[test]
    fn test_caller_cannot_set_reserved_fields() {
        let store = create_test_store();
        let request = IngestRequest::Json(json!({
            "type": "emergency_stop",
            "id": "1",
            "screenshot": "/elsewhere.png"
        }));

        let receipt = ingest(&store, request, None).unwrap();

        let stored = &store.all()[0];
        assert_ne!(receipt.event_id, "1");
        assert_eq!(stored.screenshot, None);
    }

    #[test]
    fn test_receipt_serialization() {
        let receipt = IngestReceipt {
            success: true,
            event_id: "1714564800123".to_string(),
        };
        assert_eq!(
            serde_json::to_value(receipt).unwrap(),
            json!({"success": true, "eventId": "1714564800123"})
        );
    }
}
