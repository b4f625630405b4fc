use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::id::SnapshotId;

use super::{Category, ProviderError};

/// Component rows for one category, keyed by snapshot id.
///
/// Payloads are stored bitcode-encoded, the way a provider would write a
/// blob column. Clones share storage.
pub struct ComponentTable<C> {
    category: Category,
    rows: Arc<RwLock<BTreeMap<SnapshotId, Vec<u8>>>>,
    _component: PhantomData<fn() -> C>,
}

impl<C> Clone for ComponentTable<C> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            rows: Arc::clone(&self.rows),
            _component: PhantomData,
        }
    }
}

impl<C: Serialize + DeserializeOwned> ComponentTable<C> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            _component: PhantomData,
        }
    }

    pub fn put(&self, snapshot_id: SnapshotId, component: &C) -> Result<(), ProviderError> {
        let bytes = bitcode::serialize(component)
            .map_err(|e| ProviderError::Codec(self.category, e.to_string()))?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| ProviderError::Save(self.category, "component table poisoned".into()))?;
        rows.insert(snapshot_id, bytes);
        Ok(())
    }

    pub fn get(&self, snapshot_id: SnapshotId) -> Result<Option<C>, ProviderError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| ProviderError::Load(self.category, "component table poisoned".into()))?;
        rows.get(&snapshot_id)
            .map(|bytes| {
                bitcode::deserialize(bytes)
                    .map_err(|e| ProviderError::Codec(self.category, e.to_string()))
            })
            .transpose()
    }

    pub fn delete(&self, snapshot_ids: &[SnapshotId]) -> Result<usize, ProviderError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| ProviderError::Remove(self.category, "component table poisoned".into()))?;
        Ok(snapshot_ids
            .iter()
            .filter(|id| rows.remove(id).is_some())
            .count())
    }

    pub fn contains(&self, snapshot_id: SnapshotId) -> bool {
        self.rows
            .read()
            .map(|rows| rows.contains_key(&snapshot_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
