/// ID types for Calm Mixer entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform audio handle identifier
///
/// Issued by an `AudioService` when a clip is loaded. The id is `Copy` so it
/// can address a handle while the owning `PlaybackHandle` stays in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(u64);

impl HandleId {
    /// Create a new handle ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

impl From<u64> for HandleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
