use std::sync::{Mutex, MutexGuard};

use crate::id::SnapshotId;
use crate::player::Player;

use super::{Category, ProviderError, SnapshotProvider};

/// The raw half of a provider: how one category is read from a player,
/// persisted, loaded back, and written into a player again.
pub trait ComponentSource: Send + Sync {
    type Player: Player;
    type Component: Clone + Send;

    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Read the player's state and persist it under `snapshot_id`.
    ///
    /// Returns what was written, or `None` if there was nothing to capture.
    fn capture(
        &self,
        snapshot_id: SnapshotId,
        player: &Self::Player,
    ) -> Result<Option<Self::Component>, ProviderError>;

    fn load(&self, snapshot_id: SnapshotId) -> Result<Option<Self::Component>, ProviderError>;

    fn apply(&self, component: &Self::Component, player: &Self::Player) -> Result<(), ProviderError>;

    fn delete(&self, snapshot_ids: &[SnapshotId]) -> Result<(), ProviderError>;
}

/// Provider adapter that remembers the last component it wrote.
///
/// `fetch_latest` serves that component without touching storage when the
/// id matches. Deletion clears the slot while still holding it, so a reader
/// can never get a component whose snapshot is already gone.
pub struct CachedProvider<S: ComponentSource> {
    source: S,
    last: Mutex<Option<(SnapshotId, S::Component)>>,
}

impl<S: ComponentSource> CachedProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Component for `snapshot_id`, from the single-slot cache or storage.
    pub fn fetch_latest(&self, snapshot_id: SnapshotId) -> Result<Option<S::Component>, ProviderError> {
        let last = self.slot(ProviderError::Load)?;
        if let Some((id, component)) = last.as_ref() {
            if *id == snapshot_id {
                return Ok(Some(component.clone()));
            }
        }
        self.source.load(snapshot_id)
    }

    /// Id of the cached component, if any.
    pub fn cached_id(&self) -> Option<SnapshotId> {
        self.last.lock().ok()?.as_ref().map(|(id, _)| *id)
    }

    fn slot(
        &self,
        err: fn(Category, String) -> ProviderError,
    ) -> Result<MutexGuard<'_, Option<(SnapshotId, S::Component)>>, ProviderError> {
        self.last
            .lock()
            .map_err(|_| err(self.source.category(), "component cache poisoned".into()))
    }
}

impl<S: ComponentSource> SnapshotProvider<S::Player> for CachedProvider<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn category(&self) -> Category {
        self.source.category()
    }

    fn save(&self, snapshot_id: SnapshotId, player: &S::Player) -> Result<(), ProviderError> {
        let written = self.source.capture(snapshot_id, player)?;
        let mut last = self.slot(ProviderError::Save)?;
        *last = written.map(|component| (snapshot_id, component));
        Ok(())
    }

    fn restore(&self, snapshot_id: SnapshotId, player: &S::Player) -> Result<bool, ProviderError> {
        match self.fetch_latest(snapshot_id)? {
            Some(component) => {
                self.source.apply(&component, player)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, snapshot_ids: &[SnapshotId]) -> Result<(), ProviderError> {
        let mut last = self.slot(ProviderError::Remove)?;
        let result = self.source.delete(snapshot_ids);
        if matches!(last.as_ref(), Some((id, _)) if snapshot_ids.contains(id)) {
            *last = None;
        }
        result
    }

    fn contains(&self, snapshot_id: SnapshotId) -> Result<bool, ProviderError> {
        Ok(self.fetch_latest(snapshot_id)?.is_some())
    }
}
