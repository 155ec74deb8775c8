//! Webhook Event Log
//!
//! A small HTTP service that receives events from devices, keeps the most
//! recent ones in a bounded newest-first log and persists that log as a
//! JSON snapshot on every change.
//!
//! # Features
//!
//! - **Bounded log**: At most `capacity` events, oldest evicted first
//! - **Write-through**: A mutation is acknowledged only once the snapshot is on disk
//! - **Flexible ingestion**: JSON bodies, urlencoded forms and multipart uploads
//! - **Screenshots**: Uploaded images are stored and served under `/event-images`
//!
//! # Modules
//!
//! - `types`: Event and candidate structures
//! - `event_store`: The bounded log and its snapshot persistence
//! - `handlers`: Ingestion and query operations over the store
//! - `attachments`: Storage for uploaded images
//! - `api`: Axum router and REST endpoints
//! - `config`: Environment-driven configuration
//! - `utils`: Timestamps, id generation, atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use webhook_events::{EventCandidate, EventStore, EventStoreConfig};
//!
//! let store = EventStore::open(&EventStoreConfig::new("events.json")).unwrap();
//! store.insert(EventCandidate::typed("motion")).unwrap();
//! assert_eq!(store.filter("motion").len(), 1);
//! ```

pub mod api;
pub mod attachments;
pub mod config;
pub mod event_store;
pub mod handlers;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use attachments::AttachmentStore;
pub use config::{AppConfig, ConfigError};
pub use event_store::{
    EventStore, EventStoreConfig, EventStoreError, EventStoreResult, SnapshotManager,
    SnapshotStore,
};
pub use types::{Event, EventCandidate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
