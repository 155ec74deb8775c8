//! Boundary operations over the event store
//!
//! These are what a transport layer calls:
//! - `ingest(request, attachment?) -> {eventId}`
//! - `list_all()`, `list_by_type(type)`, `type_counts()`, `status()`
//! - `clear_all() -> {success}`

mod ingest;
mod query;

pub use ingest::{ingest, normalize, submit, IngestReceipt, IngestRequest, EVENT_FIELD};
pub use query::{
    clear_all, list_all, list_by_type, status, type_counts, ClearReceipt, LogStatus, TypeCount,
};
