//! Utility functions and helpers
//!
//! Atomic file writes, ISO 8601 timestamps and event id generation.

pub mod atomic;
pub mod time;

pub use atomic::{atomic_write, atomic_write_with, move_aside, remove_stale_temp, temp_path_for};
pub use time::{current_timestamp_millis, now_iso8601, to_iso8601, EventIdGenerator};
