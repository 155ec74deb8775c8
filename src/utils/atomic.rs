//! Atomic file operations
//!
//! Snapshots and uploaded attachments are written with the same pattern:
//!
//! 1. Write to a temporary sibling file (`<name>.tmp`)
//! 2. Call sync_all() to flush to disk
//! 3. Rename temp file to final path (atomic on most filesystems)
//!
//! A reader of the final path sees either the old contents or the new
//! contents, never a partially written file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the temporary sibling used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically write content to a file
///
/// # Example
///
/// ```ignore
/// atomic_write("public/event-images/1700000000000-shot.png", &bytes)?;
/// ```
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> io::Result<()> {
    atomic_write_with(path, |file| file.write_all(content.as_ref()))
}

/// Atomically write content using a writer function
///
/// Avoids building the whole document in memory when the caller can
/// stream it (e.g. `serde_json::to_writer_pretty`).
///
/// # Example
///
/// ```ignore
/// atomic_write_with("events.json", |file| {
///     writeln!(file, "[]")?;
///     Ok(())
/// })?;
/// ```
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        write_fn(&mut file)?;
        file.sync_all()
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
}

/// Move a file aside to `backup`, replacing any earlier backup
///
/// # Returns
///
/// * `Ok(true)` - File was moved
/// * `Ok(false)` - Source file doesn't exist
pub fn move_aside<P1, P2>(from: P1, backup: P2) -> io::Result<bool>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let from = from.as_ref();
    let backup = backup.as_ref();

    if !from.exists() {
        return Ok(false);
    }

    if backup.exists() {
        fs::remove_file(backup)?;
    }
    fs::rename(from, backup)?;

    Ok(true)
}

/// Remove the temp file an interrupted write to `path` may have left behind
///
/// Returns whether a stale file was found.
pub fn remove_stale_temp<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    let temp_path = temp_path_for(path.as_ref());
    match fs::remove_file(&temp_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
