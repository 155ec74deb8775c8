//! Shared application state for HTTP handlers

use std::sync::Arc;

use crate::attachments::AttachmentStore;
use crate::event_store::EventStore;

pub struct AppState {
    /// The event log
    pub store: Arc<EventStore>,

    /// Where uploaded screenshots are written
    pub attachments: AttachmentStore,

    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<EventStore>, attachments: AttachmentStore, max_upload_bytes: usize) -> Self {
        Self {
            store,
            attachments,
            max_upload_bytes,
        }
    }
}
