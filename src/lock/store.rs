use crate::id::{PlayerId, ServerId};
use crate::repository::RepositoryError;

use super::LockRecord;

/// Persistence for the lock table. One row per player.
///
/// Implementations map onto a table keyed by player id with an
/// upsert-on-conflict write; the in-memory store is the reference.
pub trait LockStore: Send + Sync {
    fn get(&self, player: &PlayerId) -> Result<Option<LockRecord>, RepositoryError>;

    /// Insert the row, replacing any existing row for the same player.
    ///
    /// Only for re-asserting rows this server already hosts; claims go
    /// through the conditional writes below.
    fn upsert(&self, record: LockRecord) -> Result<(), RepositoryError>;

    /// Insert the row only if the player has none. Returns false if a row
    /// already exists.
    fn insert_if_absent(&self, record: LockRecord) -> Result<bool, RepositoryError>;

    /// Replace the player's row only if it is still held by `expected`.
    /// Returns false if the row is gone or held by someone else.
    fn replace_if_owner(
        &self,
        record: LockRecord,
        expected: &ServerId,
    ) -> Result<bool, RepositoryError>;

    /// Delete the player's row only if `server` owns it. Returns true if a row was removed.
    fn delete(&self, player: &PlayerId, server: &ServerId) -> Result<bool, RepositoryError>;

    /// Delete the player's row whoever owns it. Returns the number of rows removed.
    fn delete_by_player(&self, player: &PlayerId) -> Result<usize, RepositoryError>;

    fn delete_all(&self) -> Result<usize, RepositoryError>;

    fn list_by_server(&self, server: &ServerId) -> Result<Vec<LockRecord>, RepositoryError>;
}
