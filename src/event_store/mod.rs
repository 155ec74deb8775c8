//! Event Store Module
//!
//! - `EventStore`: bounded, newest-first event log with write-through persistence
//! - `SnapshotStore`: durable mirror of the log (`SnapshotManager` on disk,
//!   `MemorySnapshot` in memory)
//!
//! # Architecture
//!
//! ```text
//! Write Path (insert / clear):
//! ┌──────────┐    ┌────────────────┐    ┌───────────────────┐    ┌──────────┐
//! │ webhook  │───►│ write lock     │───►│ save full snapshot│───►│ release  │
//! │ request  │    │ prepend + evict│    │ tmp + fsync + mv  │    │ (or undo)│
//! └──────────┘    └────────────────┘    └───────────────────┘    └──────────┘
//!
//! Read Path (all / filter):
//! ┌───────────┐    ┌──────────────────┐
//! │ read lock │───►│ copy out, release│───► caller owns the snapshot
//! └───────────┘    └──────────────────┘
//! ```

mod error;
mod snapshot;
mod store;

pub use error::{EventStoreError, EventStoreResult};
pub use snapshot::{MemorySnapshot, SnapshotManager, SnapshotStore};
pub use store::{EventStore, EventStoreConfig, DEFAULT_CAPACITY};
