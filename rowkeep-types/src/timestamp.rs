//! Wall-clock timestamps stamped on rows.
//!
//! Stored as milliseconds since the Unix epoch. Older writers stored
//! human-readable date strings, so reading a timestamp back also accepts
//! RFC 3339 text.

use crate::Error;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Creates a timestamp from raw milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Reads a timestamp from a stored attribute value.
    ///
    /// Integers are taken as milliseconds; strings must be RFC 3339.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self)
                .ok_or_else(|| Error::InvalidTimestamp(format!("not an integer: {n}"))),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Self(dt.timestamp_millis()))
                .map_err(|e| Error::InvalidTimestamp(format!("{s}: {e}"))),
            other => Err(Error::InvalidTimestamp(format!("unsupported value: {other}"))),
        }
    }

    /// Returns the JSON value written to rows.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::from(self.0)
    }

    /// Formats the timestamp as RFC 3339 (UTC, millisecond precision).
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        match Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
