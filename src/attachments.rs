//! Storage for uploaded event images
//!
//! Files land in the images directory as `<millis>-<sanitized name>` and
//! are referenced from events as `/event-images/<file>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::utils::{atomic_write, EventIdGenerator};

/// URL prefix under which stored images are served
pub const PUBLIC_PREFIX: &str = "/event-images";

const MAX_NAME_LEN: usize = 100;

pub struct AttachmentStore {
    dir: PathBuf,
    names: Mutex<EventIdGenerator>,
}

impl AttachmentStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            names: Mutex::new(EventIdGenerator::default()),
        }
    }

    /// Directory holding the images
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the images directory if it is missing
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Write an uploaded file and return its public reference
    pub fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
        let stamp = self
            .names
            .lock()
            .next()
            .ok_or_else(|| io::Error::other("attachment name stamps exhausted"))?;
        let file_name = format!("{}-{}", stamp, sanitize_file_name(original_name));

        atomic_write(self.dir.join(&file_name), bytes)?;
        tracing::debug!(file = %file_name, size = bytes.len(), "Stored attachment");

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}

/// Reduce a client-supplied file name to a safe single path component
pub fn sanitize_file_name(original: Option<&str>) -> String {
    let base = original
        .and_then(|name| name.rsplit(|c: char| c == '/' || c == '\\').next())
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "upload".to_string();
    }

    // Keep the tail so the extension survives truncation
    let skip = cleaned.chars().count().saturating_sub(MAX_NAME_LEN);
    cleaned.chars().skip(skip).collect()
}
