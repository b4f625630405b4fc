use chrono::NaiveDateTime;

use crate::id::{PlayerId, SnapshotId};
use crate::repository::RepositoryError;

use super::{Snapshot, SnapshotCause};

/// Persistence for snapshot headers. Owns id generation.
pub trait SnapshotStore: Send + Sync {
    /// Insert a header and return it with its newly assigned id.
    fn insert(
        &self,
        player: &PlayerId,
        cause: SnapshotCause,
        created_at: NaiveDateTime,
    ) -> Result<Snapshot, RepositoryError>;

    fn get(&self, id: SnapshotId) -> Result<Option<Snapshot>, RepositoryError>;

    /// Most recent header by creation time (ties broken by id).
    fn latest_by_player(&self, player: &PlayerId) -> Result<Option<Snapshot>, RepositoryError>;

    /// Every header for the player, oldest first.
    fn list_by_player(&self, player: &PlayerId) -> Result<Vec<Snapshot>, RepositoryError>;

    /// Returns the number of headers removed.
    fn delete_by_ids(&self, ids: &[SnapshotId]) -> Result<usize, RepositoryError>;
}
