use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::id::{PlayerId, SnapshotId};

use super::SnapshotCause;

/// Snapshot header. Components reference `id`; the header never references them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub player_id: PlayerId,
    pub cause: SnapshotCause,
    pub created_at: NaiveDateTime,
}

impl Snapshot {
    pub fn day(&self) -> NaiveDate {
        self.created_at.date()
    }
}
