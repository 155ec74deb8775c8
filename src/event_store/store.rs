//! Event Store - bounded, newest-first event log
//!
//! The EventStore keeps at most `capacity` events in memory, newest at
//! index 0, and writes the full list through its [`SnapshotStore`] before
//! any mutation is reported as done.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::types::{Event, EventCandidate};
use crate::utils::{now_iso8601, EventIdGenerator};

use super::error::{EventStoreError, EventStoreResult};
use super::snapshot::{SnapshotManager, SnapshotStore};

/// Default maximum number of retained events
pub const DEFAULT_CAPACITY: usize = 500;

/// Configuration for the EventStore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// Maximum number of retained events
    pub capacity: usize,
    /// Path to the snapshot file
    pub snapshot_path: PathBuf,
    /// Start empty (moving the file aside) instead of failing on a corrupt snapshot
    pub discard_corrupt_snapshot: bool,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            snapshot_path: PathBuf::from("events.json"),
            discard_corrupt_snapshot: false,
        }
    }
}

impl EventStoreConfig {
    /// Create config with a custom snapshot path
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// File-backed snapshot manager for this config
    pub fn snapshot_manager(&self) -> SnapshotManager {
        SnapshotManager::new(&self.snapshot_path).discard_corrupt(self.discard_corrupt_snapshot)
    }
}

/// State guarded by the store lock
struct LogState {
    /// Newest first
    events: VecDeque<Event>,
    ids: EventIdGenerator,
}

/// The bounded event log
pub struct EventStore {
    capacity: usize,
    state: RwLock<LogState>,
    persistence: Box<dyn SnapshotStore>,
}

impl EventStore {
    /// Open a file-backed store described by `config`
    pub fn open(config: &EventStoreConfig) -> EventStoreResult<Self> {
        Self::open_with(config.capacity, Box::new(config.snapshot_manager()))
    }

    /// Open a store over any snapshot backend
    ///
    /// Loads the persisted events, trims them to `capacity` if needed and
    /// makes sure a snapshot exists afterwards.
    pub fn open_with(
        capacity: usize,
        persistence: Box<dyn SnapshotStore>,
    ) -> EventStoreResult<Self> {
        let capacity = capacity.max(1);
        let mut events: VecDeque<Event> = persistence.load()?.into();

        let trimmed = events.len() > capacity;
        if trimmed {
            tracing::warn!(
                loaded = events.len(),
                capacity,
                "Snapshot holds more events than capacity, dropping the oldest"
            );
            events.truncate(capacity);
        }

        if trimmed || !persistence.exists() {
            persistence
                .save(events.make_contiguous())
                .map_err(EventStoreError::PersistenceWriteFailure)?;
        }

        let last_id = events.iter().filter_map(Event::numeric_id).max().unwrap_or(0);

        tracing::info!(
            location = %persistence.location(),
            events = events.len(),
            capacity,
            "Opened event log"
        );

        Ok(Self {
            capacity,
            state: RwLock::new(LogState {
                events,
                ids: EventIdGenerator::starting_after(last_id),
            }),
            persistence,
        })
    }

    /// Flush the current contents one last time
    pub fn close(&self) -> EventStoreResult<()> {
        let mut state = self.state.write();
        self.persistence
            .save(state.events.make_contiguous())
            .map_err(EventStoreError::PersistenceWriteFailure)?;

        tracing::info!(
            location = %self.persistence.location(),
            events = state.events.len(),
            "Closed event log"
        );
        Ok(())
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events currently held
    pub fn len(&self) -> usize {
        self.state.read().events.len()
    }

    /// Whether the log holds no events
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Where the snapshot lives
    pub fn location(&self) -> String {
        self.persistence.location()
    }

    /// Store a new event
    ///
    /// Assigns id and timestamp, prepends the event and evicts the oldest
    /// events beyond capacity. If the snapshot cannot be written the insert
    /// is undone and `PersistenceWriteFailure` is returned.
    pub fn insert(&self, candidate: EventCandidate) -> EventStoreResult<Event> {
        let candidate = candidate.normalize()?;

        let mut state = self.state.write();
        let previous_id = state.ids.last();
        let id = state
            .ids
            .next()
            .ok_or(EventStoreError::IdsExhausted { last: previous_id })?;
        let event = candidate.into_event(id.to_string(), now_iso8601());

        state.events.push_front(event.clone());
        let mut evicted = Vec::new();
        while state.events.len() > self.capacity {
            if let Some(oldest) = state.events.pop_back() {
                evicted.push(oldest);
            }
        }

        let saved = self.persistence.save(state.events.make_contiguous());
        if let Err(e) = saved {
            state.events.pop_front();
            for oldest in evicted.into_iter().rev() {
                state.events.push_back(oldest);
            }
            state.ids.rewind_to(previous_id);
            return Err(EventStoreError::PersistenceWriteFailure(e));
        }

        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "Evicted oldest events");
        }

        Ok(event)
    }

    /// All events, newest first
    pub fn all(&self) -> Vec<Event> {
        self.state.read().events.iter().cloned().collect()
    }

    /// Events whose type equals `event_type` exactly, newest first
    pub fn filter(&self, event_type: &str) -> Vec<Event> {
        self.state
            .read()
            .events
            .iter()
            .filter(|e| e.is_type(event_type))
            .cloned()
            .collect()
    }

    /// Remove every event
    ///
    /// If the empty snapshot cannot be written the events are restored and
    /// `PersistenceWriteFailure` is returned.
    pub fn clear(&self) -> EventStoreResult<()> {
        let mut state = self.state.write();
        let removed = std::mem::take(&mut state.events);

        if let Err(e) = self.persistence.save(&[]) {
            state.events = removed;
            return Err(EventStoreError::PersistenceWriteFailure(e));
        }

        tracing::info!(removed = removed.len(), "Cleared event log");
        Ok(())
    }
}
