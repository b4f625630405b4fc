use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::clock::Clock;
use crate::id::{PlayerId, SnapshotId};
use crate::player::Player;
use crate::provider::{Category, ProviderError, ProviderRegistry};
use crate::repository::RepositoryError;
use crate::retention::RetentionPolicy;
use crate::sync::RestoreMarkers;
use crate::worker::WorkerPool;

use super::{CaptureError, RemoveError, Snapshot, SnapshotCause, SnapshotStore};

/// Outcome of applying one snapshot to a player, per provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub snapshot_id: SnapshotId,
    /// Categories that had a component and were applied.
    pub applied: Vec<Category>,
    /// Categories with no component for this snapshot.
    pub missing: Vec<Category>,
    /// Providers that failed, by name.
    pub failed: Vec<(String, ProviderError)>,
}

impl RestoreReport {
    fn new(snapshot_id: SnapshotId) -> Self {
        Self {
            snapshot_id,
            applied: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Creates, restores, and removes snapshots.
///
/// Cloning shares the same manager. Removal holds the write side of an
/// internal gate while headers and components go, and every read path holds
/// the read side, so no reader sees a header without its components or
/// components without their header.
pub struct SnapshotManager<P> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    store: Arc<dyn SnapshotStore>,
    providers: ProviderRegistry<P>,
    markers: Arc<RestoreMarkers>,
    retention: RetentionPolicy,
    clock: Arc<dyn Clock>,
    pool: Arc<WorkerPool>,
    removal: RwLock<()>,
}

impl<P> Clone for SnapshotManager<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Player + 'static> SnapshotManager<P> {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        providers: ProviderRegistry<P>,
        markers: Arc<RestoreMarkers>,
        retention: RetentionPolicy,
        clock: Arc<dyn Clock>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                providers,
                markers,
                retention,
                clock,
                pool,
                removal: RwLock::new(()),
            }),
        }
    }

    pub fn markers(&self) -> &Arc<RestoreMarkers> {
        &self.inner.markers
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.inner.pool
    }

    pub fn providers(&self) -> &ProviderRegistry<P> {
        &self.inner.providers
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.inner.retention
    }

    /// Take a snapshot of `player` and schedule a retention sweep.
    ///
    /// Refused while the player is being restored. A failing provider is
    /// logged and skipped; the snapshot keeps whatever the others wrote.
    pub fn create(&self, player: &P, cause: SnapshotCause) -> Result<SnapshotId, CaptureError> {
        let player_id = player.id();
        if self.inner.markers.is_restoring(&player_id) {
            return Err(CaptureError::RestoreInProgress(player_id));
        }

        let header = self
            .inner
            .store
            .insert(&player_id, cause, self.inner.clock.now())?;

        for registration in self.inner.providers.iter() {
            let provider = &registration.provider;
            if let Err(e) = provider.save(header.id, player) {
                tracing::error!(
                    cause = %cause,
                    player = %player.name(),
                    player_id = %player_id,
                    snapshot_id = header.id,
                    provider = %provider.name(),
                    category = %provider.category(),
                    error = %e,
                    "failed to save snapshot component"
                );
            }
        }

        self.wipe_async(player_id);
        Ok(header.id)
    }

    /// Snapshot every player independently. Returns how many succeeded.
    ///
    /// Players being restored are skipped; other failures are logged.
    pub fn create_many<'a, I>(&self, players: I, cause: SnapshotCause) -> usize
    where
        I: IntoIterator<Item = &'a P>,
        P: 'a,
    {
        let started = Instant::now();
        let mut attempted = 0;
        let mut succeeded = 0;

        for player in players {
            attempted += 1;
            if self.inner.markers.is_restoring(&player.id()) {
                tracing::debug!(player = %player.name(), cause = %cause, "restore pending, skipped");
                continue;
            }
            match self.create(player, cause) {
                Ok(_) => succeeded += 1,
                Err(e) => tracing::error!(
                    cause = %cause,
                    player = %player.name(),
                    error = %e,
                    "failed to snapshot player"
                ),
            }
        }

        tracing::info!(
            cause = %cause,
            players = attempted,
            succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch snapshot finished"
        );
        succeeded
    }

    pub fn get(&self, id: SnapshotId) -> Result<Option<Snapshot>, RepositoryError> {
        let _read = self.read_gate()?;
        self.inner.store.get(id)
    }

    pub fn latest(&self, player: &PlayerId) -> Result<Option<Snapshot>, RepositoryError> {
        let _read = self.read_gate()?;
        self.inner.store.latest_by_player(player)
    }

    /// Player's history, oldest first.
    pub fn list(&self, player: &PlayerId) -> Result<Vec<Snapshot>, RepositoryError> {
        let _read = self.read_gate()?;
        self.inner.store.list_by_player(player)
    }

    /// Apply every provider's component of `snapshot` to `player`.
    ///
    /// Providers run in priority order and are all attempted; absent
    /// components are not failures.
    pub fn restore(&self, snapshot: &Snapshot, player: &P) -> Result<RestoreReport, RepositoryError> {
        let _read = self.read_gate()?;
        let mut report = RestoreReport::new(snapshot.id);

        for registration in self.inner.providers.iter() {
            let provider = &registration.provider;
            match provider.restore(snapshot.id, player) {
                Ok(true) => report.applied.push(provider.category()),
                Ok(false) => report.missing.push(provider.category()),
                Err(e) => {
                    tracing::error!(
                        player = %player.name(),
                        snapshot_id = snapshot.id,
                        provider = %provider.name(),
                        category = %provider.category(),
                        error = %e,
                        "failed to restore snapshot component"
                    );
                    report.failed.push((provider.name().to_string(), e));
                }
            }
        }

        Ok(report)
    }

    /// Delete headers and every provider's components for `ids`.
    ///
    /// If any provider fails, the headers stay so a later sweep retries the
    /// whole set. Until then those snapshots restore without the categories
    /// that were already removed.
    pub fn remove(&self, ids: &[SnapshotId]) -> Result<usize, RemoveError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _write = self.write_gate()?;

        let mut failed = Vec::new();
        let mut removed = Vec::new();
        for registration in self.inner.providers.iter() {
            let provider = &registration.provider;
            if let Err(e) = provider.remove(ids) {
                tracing::error!(
                    provider = %provider.name(),
                    category = %provider.category(),
                    snapshots = ids.len(),
                    error = %e,
                    "failed to remove snapshot components"
                );
                failed.push(provider.name().to_string());
            } else {
                removed.push(provider.category());
            }
        }
        if !failed.is_empty() {
            let gone: Vec<&str> = removed.iter().map(|c| c.as_str()).collect();
            tracing::warn!(
                snapshots = ?ids,
                removed = ?gone,
                failed = ?failed,
                "snapshot headers kept with components partly removed"
            );
            return Err(RemoveError::Incomplete {
                providers: failed,
                removed,
            });
        }

        Ok(self.inner.store.delete_by_ids(ids)?)
    }

    /// Trim the player's history to the retention policy now.
    pub fn wipe(&self, player: &PlayerId) -> Result<Vec<SnapshotId>, RemoveError> {
        let history = self.list(player)?;
        let today = self.inner.clock.now().date();
        let removing = self.inner.retention.plan(&history, today);
        if removing.is_empty() {
            return Ok(removing);
        }

        self.remove(&removing)?;
        tracing::debug!(player_id = %player, removed = removing.len(), "retention sweep");
        Ok(removing)
    }

    /// Run `wipe` on the worker pool. Failures are logged and left for the
    /// next sweep.
    pub fn wipe_async(&self, player: PlayerId) -> bool {
        let manager = self.clone();
        self.inner.pool.submit(move || {
            if let Err(e) = manager.wipe(&player) {
                tracing::error!(player_id = %player, error = %e, "retention sweep failed");
            }
        })
    }

    fn read_gate(&self) -> Result<RwLockReadGuard<'_, ()>, RepositoryError> {
        self.inner
            .removal
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot read gate"))
    }

    fn write_gate(&self) -> Result<RwLockWriteGuard<'_, ()>, RepositoryError> {
        self.inner
            .removal
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("snapshot removal gate"))
    }
}
