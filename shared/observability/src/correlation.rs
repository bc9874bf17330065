//! Correlation identifiers for mediated access requests.
//!
//! Every access attempt gets a fresh correlation id that ties together the
//! audit trail, the structured log lines and the caller-visible outcome.
//! Correlation ids travel as explicit values; nothing is stashed in
//! task-local or thread-local storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier correlating every log and audit entry of a single access attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Create a fresh correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
