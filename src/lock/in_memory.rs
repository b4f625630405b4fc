use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::id::{PlayerId, ServerId};
use crate::repository::RepositoryError;

use super::{LockRecord, LockStore};

/// In-memory lock table backed by `Arc<RwLock<HashMap>>`.
///
/// Clones share storage, so several coordinators in one test process see the
/// same table the way several servers share one database.
#[derive(Clone, Default)]
pub struct InMemoryLockStore {
    rows: Arc<RwLock<HashMap<PlayerId, LockRecord>>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LockStore for InMemoryLockStore {
    fn get(&self, player: &PlayerId) -> Result<Option<LockRecord>, RepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("lock read"))?;
        Ok(rows.get(player).cloned())
    }

    fn upsert(&self, record: LockRecord) -> Result<(), RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock upsert"))?;
        rows.insert(record.player_id, record);
        Ok(())
    }

    fn insert_if_absent(&self, record: LockRecord) -> Result<bool, RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock insert"))?;
        if rows.contains_key(&record.player_id) {
            return Ok(false);
        }
        rows.insert(record.player_id, record);
        Ok(true)
    }

    fn replace_if_owner(
        &self,
        record: LockRecord,
        expected: &ServerId,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock replace"))?;
        match rows.get(&record.player_id) {
            Some(row) if row.is_owned_by(expected) => {
                rows.insert(record.player_id, record);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete(&self, player: &PlayerId, server: &ServerId) -> Result<bool, RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock delete"))?;
        match rows.get(player) {
            Some(row) if row.is_owned_by(server) => {
                rows.remove(player);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_by_player(&self, player: &PlayerId) -> Result<usize, RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock delete"))?;
        Ok(usize::from(rows.remove(player).is_some()))
    }

    fn delete_all(&self) -> Result<usize, RepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("lock delete"))?;
        let count = rows.len();
        rows.clear();
        Ok(count)
    }

    fn list_by_server(&self, server: &ServerId) -> Result<Vec<LockRecord>, RepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("lock read"))?;
        Ok(rows
            .values()
            .filter(|row| row.is_owned_by(server))
            .cloned()
            .collect())
    }
}
