//! Identifier newtypes
//!
//! Numeric identifiers travel on the wire as plain JSON integers; the
//! newtypes keep request ids, layer ids and session ids from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation id stamped on every outbound request and echoed back
///
/// Unique for the lifetime of a [`ConnectionManager`](crate::adapters::peer::ConnectionManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Peer-assigned layer identifier
///
/// Only meaningful against the tree snapshot it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(i64);

impl LayerId {
    /// Wraps a raw layer id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw layer id
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LayerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifies one accepted peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw session counter
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw session counter
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}
