//! Time and id utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Format an instant as ISO 8601 with millisecond precision, e.g.
/// `2024-05-01T12:00:00.123Z`
pub fn to_iso8601(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current instant as ISO 8601
pub fn now_iso8601() -> String {
    to_iso8601(Utc::now())
}

/// Millisecond-clock id generator that never repeats or goes backwards.
///
/// Two events created within the same millisecond (or after the wall
/// clock stepped back) get `last + 1` instead of a duplicate.
#[derive(Debug, Clone, Default)]
pub struct EventIdGenerator {
    last: u64,
}

impl EventIdGenerator {
    /// Create a generator whose next id is strictly greater than `last`
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Last id handed out (or seeded)
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Next id for the given clock reading
    ///
    /// `None` once the id space is used up; the generator is left unchanged.
    pub fn next_at(&mut self, now_millis: u64) -> Option<u64> {
        let after_last = self.last.checked_add(1)?;
        self.last = now_millis.max(after_last);
        Some(self.last)
    }

    /// Next id from the wall clock
    pub fn next(&mut self) -> Option<u64> {
        self.next_at(current_timestamp_millis())
    }

    /// Put back a previous position after a rolled-back insert
    pub(crate) fn rewind_to(&mut self, last: u64) {
        self.last = last;
    }
}
