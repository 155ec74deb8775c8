//! Read-side operations and clear-all

use std::collections::HashMap;

use serde::Serialize;

use crate::event_store::{EventStore, EventStoreResult};
use crate::types::Event;

/// Reply to a successful clear
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearReceipt {
    pub success: bool,
    pub message: String,
}

/// Number of stored events of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub count: usize,
}

/// Current fill level of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStatus {
    #[serde(rename = "eventsCount")]
    pub events_count: usize,
    pub capacity: usize,
}

/// All events, newest first
pub fn list_all(store: &EventStore) -> Vec<Event> {
    store.all()
}

/// Events of one type, newest first; unknown types give an empty list
pub fn list_by_type(store: &EventStore, event_type: &str) -> Vec<Event> {
    store.filter(event_type)
}

/// Remove every event and persist the empty log
pub fn clear_all(store: &EventStore) -> EventStoreResult<ClearReceipt> {
    store.clear()?;
    Ok(ClearReceipt {
        success: true,
        message: "All events cleared".to_string(),
    })
}

/// Per-type counts, most frequent first (ties by type name)
pub fn type_counts(store: &EventStore) -> Vec<TypeCount> {
    let mut counts: HashMap<Option<String>, usize> = HashMap::new();
    for event in store.all() {
        *counts.entry(event.event_type).or_insert(0) += 1;
    }

    let mut counts: Vec<TypeCount> = counts
        .into_iter()
        .map(|(event_type, count)| TypeCount { event_type, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.event_type.cmp(&b.event_type)));
    counts
}

pub fn status(store: &EventStore) -> LogStatus {
    LogStatus {
        events_count: store.len(),
        capacity: store.capacity(),
    }
}
