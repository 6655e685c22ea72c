//! Domain identifiers (strongly-typed IDs).
//!
//! Task ids are plain sequential numbers handed out by the store's
//! [`IdGenerator`](crate::ports::IdGenerator). On the wire they travel as
//! decimal strings, so callers treat them as opaque text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::SpindleError;

/// Identifier of a Task.
///
/// - `0` is reserved for [`TaskId::UNASSIGNED`]
/// - assigned ids start at 1 and are never reused within a process
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Placeholder carried by a task that has not been stored yet.
    pub const UNASSIGNED: TaskId = TaskId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_assigned(&self) -> bool {
        *self != Self::UNASSIGNED
    }

    /// Parse a caller-supplied id.
    ///
    /// Only ASCII digits are accepted: no sign, no whitespace, no empty
    /// string, nothing past `u64::MAX`.
    pub fn parse(s: &str) -> Result<Self, SpindleError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SpindleError::InvalidId(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| SpindleError::InvalidId(s.to_string()))
    }

    /// Parse an id taken from a request path.
    ///
    /// Accepts any signed 64-bit decimal (`"+7"`, `"-1"`). Negative values
    /// are well-formed but can never name a task, so they come back as
    /// `None`. Anything else is `InvalidId`.
    pub fn parse_lookup(s: &str) -> Result<Option<Self>, SpindleError> {
        let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SpindleError::InvalidId(s.to_string()));
        }
        let value = s
            .parse::<i64>()
            .map_err(|_| SpindleError::InvalidId(s.to_string()))?;
        Ok(u64::try_from(value).ok().map(Self))
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for TaskId {
    type Err = SpindleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TaskId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
