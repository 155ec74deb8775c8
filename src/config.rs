//! Server configuration from environment variables
//!
//! | Variable                   | Default                 |
//! |----------------------------|-------------------------|
//! | `WEBHOOK_HOST`             | `0.0.0.0`               |
//! | `WEBHOOK_PORT`             | `3004`                  |
//! | `EVENTS_FILE`              | `events.json`           |
//! | `EVENTS_CAPACITY`          | `500`                   |
//! | `EVENT_IMAGES_DIR`         | `public/event-images`   |
//! | `WEBHOOK_MAX_UPLOAD_BYTES` | `10485760`              |
//! | `DISCARD_CORRUPT_SNAPSHOT` | `false`                 |
//!
//! Relative paths are resolved against the current directory.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::event_store::{EventStoreConfig, DEFAULT_CAPACITY};

pub const DEFAULT_PORT: u16 = 3004;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub listen: SocketAddr,
    /// Event log settings
    pub store: EventStoreConfig,
    /// Directory for uploaded images
    pub images_dir: PathBuf,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_lookup(|name| env::var(name).ok(), &current_dir)
    }

    /// Load using `lookup` for variables and `base_dir` for relative paths
    pub fn from_lookup<F>(lookup: F, base_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host: IpAddr = parse_var(&lookup, "WEBHOOK_HOST")?
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port: u16 = parse_var(&lookup, "WEBHOOK_PORT")?.unwrap_or(DEFAULT_PORT);

        let capacity: usize = parse_var(&lookup, "EVENTS_CAPACITY")?.unwrap_or(DEFAULT_CAPACITY);
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EVENTS_CAPACITY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let snapshot_path = resolve_path(
            base_dir,
            lookup("EVENTS_FILE").unwrap_or_else(|| "events.json".to_string()),
        );
        let images_dir = resolve_path(
            base_dir,
            lookup("EVENT_IMAGES_DIR").unwrap_or_else(|| "public/event-images".to_string()),
        );

        let max_upload_bytes =
            parse_var(&lookup, "WEBHOOK_MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let discard_corrupt_snapshot = match lookup("DISCARD_CORRUPT_SNAPSHOT") {
            Some(value) => parse_flag("DISCARD_CORRUPT_SNAPSHOT", &value)?,
            None => false,
        };

        Ok(Self {
            listen: SocketAddr::new(host, port),
            store: EventStoreConfig {
                capacity,
                snapshot_path,
                discard_corrupt_snapshot,
            },
            images_dir,
            max_upload_bytes,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn resolve_path(base_dir: &Path, path: String) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
