//! Event types for the webhook log
//!
//! An [`Event`] is the stored, immutable record: a fixed envelope
//! (`id`, `timestamp`, `type`, `screenshot`) around an open payload of
//! caller-supplied fields. An [`EventCandidate`] is what ingestion hands to
//! the store before an id and timestamp are assigned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event_store::{EventStoreError, EventStoreResult};

/// Keys the store always assigns itself; caller values are dropped
pub const RESERVED_FIELDS: [&str; 3] = ["id", "timestamp", "screenshot"];

/// Key carrying the event classification
pub const TYPE_FIELD: &str = "type";

/// A stored event
///
/// Serialized as a single flat JSON object:
///
/// ```json
/// {"id":"1714564800123","timestamp":"2024-05-01T12:00:00.123Z",
///  "type":"takeoff","battery":87,"screenshot":null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, a millisecond timestamp rendered as a string
    pub id: String,

    /// ISO 8601 creation instant assigned by the store
    pub timestamp: String,

    /// Free-form classification used for filtering
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// Additional caller-supplied fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,

    /// Reference to an attached image, `null` when none was supplied
    #[serde(default)]
    pub screenshot: Option<String>,
}

impl Event {
    /// Whether this event is classified as `event_type` (exact, case-sensitive)
    pub fn is_type(&self, event_type: &str) -> bool {
        self.event_type.as_deref() == Some(event_type)
    }

    /// Numeric value of the id, if it is one
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

/// An event description waiting to be inserted into the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCandidate {
    pub event_type: Option<String>,
    pub fields: Map<String, Value>,
    pub screenshot: Option<String>,
}

impl EventCandidate {
    /// Create an empty, untyped candidate
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a candidate with the given type
    pub fn typed(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Default::default()
        }
    }

    /// Add a payload field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Attach an image reference
    pub fn with_screenshot(mut self, screenshot: Option<String>) -> Self {
        self.screenshot = screenshot;
        self
    }

    /// Build a candidate from a decoded JSON value, which must be an object
    pub fn from_value(value: Value) -> EventStoreResult<Self> {
        match value {
            Value::Object(fields) => Self::from_object(fields),
            other => Err(EventStoreError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a candidate from JSON text
    pub fn from_json_str(text: &str) -> EventStoreResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| EventStoreError::malformed(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Build a candidate from a JSON object, lifting out its `type`
    pub fn from_object(mut fields: Map<String, Value>) -> EventStoreResult<Self> {
        let event_type = take_type(&mut fields)?;
        Ok(Self {
            event_type,
            fields,
            screenshot: None,
        })
    }

    /// Check the candidate and settle its type
    ///
    /// A `type` key left in the payload (e.g. added through
    /// [`with_field`](Self::with_field)) takes precedence over `event_type`.
    pub fn normalize(mut self) -> EventStoreResult<Self> {
        if let Some(event_type) = take_type(&mut self.fields)? {
            self.event_type = Some(event_type);
        }
        Ok(self)
    }

    /// Materialize the stored event; reserved payload keys are dropped
    pub(crate) fn into_event(self, id: String, timestamp: String) -> Event {
        let mut payload = self.fields;
        for key in RESERVED_FIELDS {
            payload.remove(key);
        }
        payload.remove(TYPE_FIELD);

        Event {
            id,
            timestamp,
            event_type: self.event_type,
            payload,
            screenshot: self.screenshot,
        }
    }
}

/// Remove `type` from a payload; must be a string or null when present
fn take_type(fields: &mut Map<String, Value>) -> EventStoreResult<Option<String>> {
    match fields.remove(TYPE_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(EventStoreError::malformed(format!(
            "field 'type' must be a string, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> Event {
        EventCandidate::typed("takeoff")
            .with_field("battery", json!(87))
            .with_field("data", json!({"height": 30}))
            .into_event("1714564800123".to_string(), "2024-05-01T12:00:00.123Z".to_string())
    }

    #[test]
    fn test_event_serializes_flat() {
        let value = serde_json::to_value(sample_event()).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "1714564800123",
                "timestamp": "2024-05-01T12:00:00.123Z",
                "type": "takeoff",
                "battery": 87,
                "data": {"height": 30},
                "screenshot": null
            })
        );
    }

    #[test]
    fn test_untyped_event_omits_type() {
        let event = EventCandidate::new()
            .with_field("note", json!("hello"))
            .into_event("1".to_string(), "2024-05-01T12:00:00.000Z".to_string());
        let value = serde_json::to_value(&event).unwrap();

        assert!(value.get("type").is_none());
        assert_eq!(value["note"], "hello");
    }

    #[test]
    fn test_event_deserializes_payload_fields() {
        let event: Event = serde_json::from_value(json!({
            "id": "42",
            "timestamp": "2024-05-01T12:00:00.000Z",
            "type": "face_detected",
            "locked": true,
            "screenshot": "/event-images/42-face.jpg"
        }))
        .unwrap();

        assert_eq!(event.event_type.as_deref(), Some("face_detected"));
        assert_eq!(event.payload.get("locked"), Some(&json!(true)));
        assert!(!event.payload.contains_key("type"));
        assert_eq!(event.screenshot.as_deref(), Some("/event-images/42-face.jpg"));
        assert_eq!(event.numeric_id(), Some(42));
    }

    #[test]
    fn test_reserved_fields_are_dropped() {
        let candidate = EventCandidate::from_value(json!({
            "type": "land",
            "id": "spoofed",
            "timestamp": "yesterday",
            "screenshot": "/etc/passwd",
            "flight_time": 120
        }))
        .unwrap();

        let event = candidate.into_event("7".to_string(), "2024-05-01T12:00:00.000Z".to_string());

        assert_eq!(event.id, "7");
        assert_eq!(event.timestamp, "2024-05-01T12:00:00.000Z");
        assert_eq!(event.screenshot, None);
        assert_eq!(event.payload.len(), 1);
        assert_eq!(event.payload["flight_time"], 120);
    }

    #[test]
    fn test_type_must_be_string() {
        let err = EventCandidate::from_value(json!({"type": 3})).unwrap_err();
        assert!(matches!(err, EventStoreError::MalformedEvent(_)));

        let candidate = EventCandidate::from_value(json!({"type": null})).unwrap();
        assert_eq!(candidate.event_type, None);
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            EventCandidate::from_value(json!([1, 2])),
            Err(EventStoreError::MalformedEvent(_))
        ));
        assert!(matches!(
            EventCandidate::from_json_str("{not json"),
            Err(EventStoreError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_normalize_lifts_type_field() {
        let candidate = EventCandidate::typed("a")
            .with_field("type", json!("b"))
            .normalize()
            .unwrap();
        assert_eq!(candidate.event_type.as_deref(), Some("b"));
        assert!(candidate.fields.is_empty());

        let err = EventCandidate::new()
            .with_field("type", json!(["x"]))
            .normalize()
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_is_type_is_case_sensitive() {
        let event = sample_event();
        assert!(event.is_type("takeoff"));
        assert!(!event.is_type("Takeoff"));
    }
}
