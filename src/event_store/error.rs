//! Errors raised by the event store and its snapshot backends

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for EventStore operations
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors that can occur in EventStore operations
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The caller supplied an event that cannot be stored. The store is unchanged.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The persisted snapshot exists but does not hold a valid event list.
    #[error("Snapshot corrupted at {}: {source}", .path.display())]
    CorruptSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the snapshot failed. The in-memory mutation was rolled back.
    #[error("Failed to persist snapshot: {0}")]
    PersistenceWriteFailure(#[source] io::Error),

    /// No id greater than the last one handed out is left.
    #[error("Event ids exhausted after {last}")]
    IdsExhausted { last: u64 },

    /// The snapshot could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl EventStoreError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EventStoreError::MalformedEvent(message.into())
    }

    /// Whether the error was caused by caller input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, EventStoreError::MalformedEvent(_))
    }
}
