use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player's stable identity across every server on the network.
pub type PlayerId = Uuid;

/// Store-assigned snapshot identity. Monotonic, never reused.
pub type SnapshotId = u64;

/// Identity of one running server process.
///
/// A fresh id is generated on every process start, so rows written by a
/// previous run of the same server carry a different id than the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(Uuid);

impl ServerId {
    pub fn random() -> Self {
        ServerId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        ServerId(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
