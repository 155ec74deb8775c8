//! Data types for the webhook events server

mod event;

pub use event::{Event, EventCandidate, RESERVED_FIELDS, TYPE_FIELD};
