use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;

use crate::id::{PlayerId, SnapshotId};
use crate::repository::RepositoryError;

use super::{Snapshot, SnapshotCause, SnapshotStore};

/// In-memory header table backed by `Arc<RwLock<BTreeMap>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). Ids start at
/// 1 and are never handed out twice, even after deletion.
#[derive(Clone)]
pub struct InMemorySnapshotStore {
    storage: Arc<RwLock<Table>>,
}

struct Table {
    rows: BTreeMap<SnapshotId, Snapshot>,
    next_id: SnapshotId,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ordered(mut rows: Vec<Snapshot>) -> Vec<Snapshot> {
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn insert(
        &self,
        player: &PlayerId,
        cause: SnapshotCause,
        created_at: NaiveDateTime,
    ) -> Result<Snapshot, RepositoryError> {
        let mut table = self
            .storage
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot insert"))?;
        let id = table.next_id;
        table.next_id += 1;

        let snapshot = Snapshot {
            id,
            player_id: *player,
            cause,
            created_at,
        };
        table.rows.insert(id, snapshot.clone());
        Ok(snapshot)
    }

    fn get(&self, id: SnapshotId) -> Result<Option<Snapshot>, RepositoryError> {
        let table = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot read"))?;
        Ok(table.rows.get(&id).cloned())
    }

    fn latest_by_player(&self, player: &PlayerId) -> Result<Option<Snapshot>, RepositoryError> {
        Ok(self.list_by_player(player)?.pop())
    }

    fn list_by_player(&self, player: &PlayerId) -> Result<Vec<Snapshot>, RepositoryError> {
        let table = self
            .storage
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot read"))?;
        let rows = table
            .rows
            .values()
            .filter(|s| &s.player_id == player)
            .cloned()
            .collect();
        Ok(Self::ordered(rows))
    }

    fn delete_by_ids(&self, ids: &[SnapshotId]) -> Result<usize, RepositoryError> {
        let mut table = self
            .storage
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot delete"))?;
        Ok(ids.iter().filter(|id| table.rows.remove(id).is_some()).count())
    }
}
