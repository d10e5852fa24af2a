use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique identifier for one conversion request, used to correlate log lines and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(Ulid);

impl ConversionId {
    /// Create a new ConversionId with a random ULID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Create a ConversionId from a ULID.
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Get the underlying ULID.
    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for ConversionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
