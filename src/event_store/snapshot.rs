//! Snapshot persistence for the event store
//!
//! The whole event list is mirrored as one document and rewritten after
//! every mutation. With at most a few hundred events a full overwrite is
//! cheap, so there is no incremental log to replay.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::Event;
use crate::utils::{atomic_write_with, move_aside, remove_stale_temp};

use super::error::{EventStoreError, EventStoreResult};

/// Durable mirror of the event list
pub trait SnapshotStore: Send + Sync {
    /// Whether a snapshot has been written before
    fn exists(&self) -> bool;

    /// Load the persisted events, newest first. Absent snapshot loads as empty.
    fn load(&self) -> EventStoreResult<Vec<Event>>;

    /// Replace the persisted events with `events`
    fn save(&self, events: &[Event]) -> io::Result<()>;

    /// Human-readable location, used in logs
    fn location(&self) -> String;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn load(&self) -> EventStoreResult<Vec<Event>> {
        (**self).load()
    }

    fn save(&self, events: &[Event]) -> io::Result<()> {
        (**self).save(events)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// File-backed snapshot: a pretty-printed JSON array of events
pub struct SnapshotManager {
    path: PathBuf,
    discard_corrupt: bool,
}

impl SnapshotManager {
    /// Create a manager for the snapshot at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            discard_corrupt: false,
        }
    }

    /// Recover from a corrupt snapshot by moving it aside and starting empty
    /// instead of failing the load
    pub fn discard_corrupt(mut self, discard: bool) -> Self {
        self.discard_corrupt = discard;
        self
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupt snapshot is moved when discarding is enabled
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn read_events(&self) -> EventStoreResult<Vec<Event>> {
        // Bytes, not a String: invalid UTF-8 is corrupt content, not an IO failure
        let content = fs::read(&self.path)?;
        serde_json::from_slice(&content).map_err(|source| EventStoreError::CorruptSnapshot {
            path: self.path.clone(),
            source,
        })
    }
}

impl SnapshotStore for SnapshotManager {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> EventStoreResult<Vec<Event>> {
        if remove_stale_temp(&self.path)? {
            tracing::warn!(path = %self.path.display(), "Removed temp file left by an interrupted save");
        }

        if !self.path.exists() {
            return Ok(Vec::new());
        }

        match self.read_events() {
            Err(EventStoreError::CorruptSnapshot { path, source }) if self.discard_corrupt => {
                let backup = self.corrupt_path();
                move_aside(&path, &backup)?;
                tracing::warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %source,
                    "Discarded corrupt snapshot, starting with an empty event log"
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn save(&self, events: &[Event]) -> io::Result<()> {
        atomic_write_with(&self.path, |file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, events)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.flush()
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory snapshot for tests and embedding without a disk
#[derive(Default)]
pub struct MemorySnapshot {
    events: Mutex<Option<Vec<Event>>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemorySnapshot {
    /// Create an empty snapshot (as if no file existed yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot that already holds `events`
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            ..Default::default()
        }
    }

    /// Currently persisted events, `None` if never saved
    pub fn persisted(&self) -> Option<Vec<Event>> {
        self.events.lock().clone()
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail, simulating a broken disk
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for MemorySnapshot {
    fn exists(&self) -> bool {
        self.events.lock().is_some()
    }

    fn load(&self) -> EventStoreResult<Vec<Event>> {
        Ok(self.events.lock().clone().unwrap_or_default())
    }

    fn save(&self, events: &[Event]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }
        *self.events.lock() = Some(events.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventCandidate;
    use crate::utils::temp_path_for;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_manager() -> (SnapshotManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path().join("events.json"));
        (manager, temp_dir)
    }

    fn create_test_events() -> Vec<Event> {
        vec![
            EventCandidate::typed("battery")
                .with_field("level", json!(15))
                .into_event("2".to_string(), "2024-05-01T12:00:01.000Z".to_string()),
            EventCandidate::typed("takeoff")
                .with_screenshot(Some("/event-images/1-shot.png".to_string()))
                .into_event("1".to_string(), "2024-05-01T12:00:00.000Z".to_string()),
        ]
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (manager, _temp_dir) = create_test_manager();
        let events = create_test_events();

        manager.save(&events).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded, events);
        assert!(!temp_path_for(manager.path()).exists());
    }

    #[test]
    fn test_snapshot_is_pretty_json_array() {
        let (manager, _temp_dir) = create_test_manager();
        manager.save(&create_test_events()).unwrap();

        let content = fs::read_to_string(manager.path()).unwrap();
        assert!(content.starts_with("[\n  {"));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["type"], "battery");
        assert_eq!(value[0]["screenshot"], serde_json::Value::Null);
        assert_eq!(value[1]["screenshot"], "/event-images/1-shot.png");
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let (manager, _temp_dir) = create_test_manager();

        assert!(!manager.exists());
        assert!(manager.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_fails_load() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), "[{\"id\": ").unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, EventStoreError::CorruptSnapshot { .. }));
        // Nothing is touched when discarding is off
        assert!(manager.path().exists());
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), "{\"events\": []}").unwrap();

        assert!(matches!(
            manager.load(),
            Err(EventStoreError::CorruptSnapshot { .. })
        ));
    }

    #[test]
    fn test_discard_corrupt_moves_file_aside() {
        let temp_dir = TempDir::new().unwrap();
        let manager =
            SnapshotManager::new(temp_dir.path().join("events.json")).discard_corrupt(true);
        fs::write(manager.path(), "not json").unwrap();

        let loaded = manager.load().unwrap();

        assert!(loaded.is_empty());
        assert!(!manager.path().exists());
        assert_eq!(fs::read_to_string(manager.corrupt_path()).unwrap(), "not json");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let (manager, _temp_dir) = create_test_manager();
        fs::write(manager.path(), b"[\xff\xfe]").unwrap();

        assert!(matches!(
            manager.load(),
            Err(EventStoreError::CorruptSnapshot { .. })
        ));
        assert!(manager.path().exists());
    }

    #[test]
    fn test_discard_invalid_utf8() {
        let temp_dir = TempDir::new().unwrap();
        let manager =
            SnapshotManager::new(temp_dir.path().join("events.json")).discard_corrupt(true);
        fs::write(manager.path(), b"[\xff\xfe]").unwrap();

        let loaded = manager.load().unwrap();

        assert!(loaded.is_empty());
        assert!(!manager.path().exists());
        assert_eq!(fs::read(manager.corrupt_path()).unwrap(), b"[\xff\xfe]");
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.json");
        // A directory where the file should be
        fs::create_dir(&path).unwrap();
        let manager = SnapshotManager::new(&path).discard_corrupt(true);

        assert!(matches!(manager.load(), Err(EventStoreError::Io(_))));
        assert!(path.is_dir());
    }

    #[test]
    fn test_load_removes_stale_temp() {
        let (manager, _temp_dir) = create_test_manager();
        manager.save(&create_test_events()).unwrap();
        fs::write(temp_path_for(manager.path()), "[{\"half\"").unwrap();

        let loaded = manager.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(!temp_path_for(manager.path()).exists());
    }

    #[test]
    fn test_memory_snapshot_counts_saves() {
        let snapshot = MemorySnapshot::new();
        assert!(!snapshot.exists());

        snapshot.save(&create_test_events()).unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.save_count(), 1);
        assert_eq!(snapshot.load().unwrap().len(), 2);

        snapshot.set_fail_writes(true);
        assert!(snapshot.save(&[]).is_err());
        assert_eq!(snapshot.save_count(), 1);
        assert_eq!(snapshot.persisted().unwrap().len(), 2);
    }
}
