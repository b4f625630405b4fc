use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::SnapshotConfig;
use crate::id::{PlayerId, SnapshotId};
use crate::lock::LockCoordinator;
use crate::player::Player;
use crate::snapshot::{CaptureError, RestoreReport, SnapshotCause, SnapshotManager};
use crate::worker::WorkerStats;

use super::{RestoreMarkers, SessionState, SyncError};

/// What `shutdown` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub captured: usize,
    pub released: usize,
    pub workers: WorkerStats,
}

/// Session table shared with jobs running on the worker pool.
#[derive(Default)]
struct Sessions {
    states: RwLock<HashMap<PlayerId, SessionState>>,
}

impl Sessions {
    fn get(&self, player: &PlayerId) -> SessionState {
        let states = match self.states.read() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        states.get(player).copied().unwrap_or(SessionState::Idle)
    }

    fn set(&self, player: PlayerId, state: SessionState) {
        let mut states = match self.states.write() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state == SessionState::Idle {
            states.remove(&player);
        } else {
            states.insert(player, state);
        }
    }

    /// Move `player` from `from` to `to`; false if it was not in `from`.
    fn advance(&self, player: PlayerId, from: SessionState, to: SessionState) -> bool {
        let mut states = match self.states.write() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = states.get(&player).copied().unwrap_or(SessionState::Idle);
        if current != from {
            return false;
        }
        if to == SessionState::Idle {
            states.remove(&player);
        } else {
            states.insert(player, to);
        }
        true
    }

    /// Mark an in-flight or active session as releasing and return the
    /// state it was in. Other states are left alone.
    fn begin_release(&self, player: PlayerId) -> SessionState {
        let mut states = match self.states.write() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = states.get(&player).copied().unwrap_or(SessionState::Idle);
        if matches!(
            current,
            SessionState::Locking | SessionState::Restoring | SessionState::Active
        ) {
            states.insert(player, SessionState::Releasing);
        }
        current
    }

    fn with_state(&self, state: SessionState) -> Vec<PlayerId> {
        let states = match self.states.read() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Drives each player's session: lock on join, restore, capture on events,
/// final capture and unlock on quit.
///
/// Event handlers (`on_*`) only decide admission on the calling thread and
/// hand the capture to the worker pool.
pub struct SyncOrchestrator<P> {
    config: SnapshotConfig,
    locks: Arc<LockCoordinator>,
    snapshots: SnapshotManager<P>,
    sessions: Arc<Sessions>,
}

impl<P: Player + 'static> SyncOrchestrator<P> {
    pub fn new(
        config: SnapshotConfig,
        locks: Arc<LockCoordinator>,
        snapshots: SnapshotManager<P>,
    ) -> Self {
        Self {
            config,
            locks,
            snapshots,
            sessions: Arc::new(Sessions::default()),
        }
    }

    pub fn locks(&self) -> &Arc<LockCoordinator> {
        &self.locks
    }

    pub fn snapshots(&self) -> &SnapshotManager<P> {
        &self.snapshots
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    fn markers(&self) -> &Arc<RestoreMarkers> {
        self.snapshots.markers()
    }

    pub fn state(&self, player: &PlayerId) -> SessionState {
        self.sessions.get(player)
    }

    pub fn is_restoring(&self, player: &PlayerId) -> bool {
        self.markers().is_restoring(player)
    }

    /// True while a restore is applying to `player`. Handlers for events
    /// the restore itself causes (inventory changes, game-mode flips) must
    /// not react while this holds.
    pub fn should_not_save_snapshot(&self, player: &PlayerId) -> bool {
        self.is_restoring(player)
    }

    /// Reclaim sessions for players already online when this server starts.
    ///
    /// No other server is asked; the caller asserts these players are here.
    pub fn start<'a, I>(&self, online: I) -> Result<usize, SyncError>
    where
        I: IntoIterator<Item = &'a P>,
        P: 'a,
    {
        let ids: Vec<PlayerId> = online.into_iter().map(|p| p.id()).collect();
        let reclaimed = self.locks.reconcile_on_startup(ids.iter().copied())?;
        for id in ids {
            self.sessions.set(id, SessionState::Active);
        }
        tracing::debug!(players = reclaimed, "sessions reclaimed");
        Ok(reclaimed)
    }

    /// Start a session: take the lock, then apply the latest snapshot.
    ///
    /// Returns the restore outcome, or `None` for a player with no history.
    /// On any failure the player is left without a session and this server
    /// holds no lock for them. A quit that lands while the lock is being
    /// taken or the restore is applying ends the join with `JoinAborted`.
    pub fn join(&self, player: &Arc<P>) -> Result<Option<RestoreReport>, SyncError> {
        let id = player.id();
        if !self.sessions.advance(id, SessionState::Idle, SessionState::Locking) {
            return Err(SyncError::SessionActive(id));
        }

        if let Err(e) = self.locks.acquire(&id) {
            tracing::warn!(player = %player.name(), player_id = %id, error = %e, "join refused");
            self.sessions.set(id, SessionState::Idle);
            return Err(e.into());
        }

        if !self.sessions.advance(id, SessionState::Locking, SessionState::Restoring) {
            return Err(self.abort_join(player.as_ref()));
        }
        let restored = {
            let _guard = self.markers().begin(&id);
            self.restore_latest(player.as_ref())
        };

        let report = match restored {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(player = %player.name(), player_id = %id, error = %e, "restore failed");
                self.release_quietly(player.as_ref());
                self.end_session(&id);
                return Err(e);
            }
        };

        if !self.sessions.advance(id, SessionState::Restoring, SessionState::Active) {
            return Err(self.abort_join(player.as_ref()));
        }

        if self.config.is_enabled(SnapshotCause::PlayerJoin) {
            self.submit_capture(Arc::clone(player), SnapshotCause::PlayerJoin);
        }
        Ok(report)
    }

    /// Undo a join that a quit overtook: the quit already skipped its
    /// capture, so only the lock and the session are left to clean up.
    fn abort_join(&self, player: &P) -> SyncError {
        let id = player.id();
        tracing::info!(player = %player.name(), player_id = %id, "player left during join");
        self.release_quietly(player);
        self.end_session(&id);
        SyncError::JoinAborted(id)
    }

    fn restore_latest(&self, player: &P) -> Result<Option<RestoreReport>, SyncError> {
        let Some(latest) = self.snapshots.latest(&player.id())? else {
            tracing::debug!(player = %player.name(), "no snapshot to restore");
            return Ok(None);
        };
        let report = self.snapshots.restore(&latest, player)?;
        tracing::info!(
            player = %player.name(),
            snapshot_id = latest.id,
            cause = %latest.cause,
            applied = report.applied.len(),
            failed = report.failed.len(),
            "restored snapshot"
        );
        Ok(Some(report))
    }

    /// Take a snapshot for a player in session, on the calling thread.
    pub fn capture(&self, player: &P, cause: SnapshotCause) -> Result<SnapshotId, SyncError> {
        let id = player.id();
        if !self.state(&id).accepts_capture() {
            return Err(CaptureError::NoSession(id).into());
        }
        Ok(self.snapshots.create(player, cause)?)
    }

    /// Take a snapshot for a player with no session on this server.
    pub fn snapshot_only(&self, player: &P, cause: SnapshotCause) -> Result<SnapshotId, SyncError> {
        let id = player.id();
        if !self.sessions.advance(id, SessionState::Idle, SessionState::SnapshotOnly) {
            return Err(SyncError::SessionActive(id));
        }
        let result = self.snapshots.create(player, cause);
        self.sessions
            .advance(id, SessionState::SnapshotOnly, SessionState::Idle);
        Ok(result?)
    }

    fn admit(&self, cause: SnapshotCause, player: &PlayerId) -> bool {
        self.config.is_enabled(cause)
            && self.state(player) == SessionState::Active
            && !self.is_restoring(player)
    }

    pub fn admit_death(&self, player: &PlayerId) -> bool {
        self.admit(SnapshotCause::PlayerDeath, player)
    }

    pub fn admit_game_mode_change(&self, player: &PlayerId) -> bool {
        self.admit(SnapshotCause::PlayerGameModeChange, player)
    }

    /// Only the primary world's save triggers a sweep, and only with
    /// players online.
    pub fn admit_world_save(&self, primary_world: bool, online: usize) -> bool {
        self.config.is_enabled(SnapshotCause::WorldSave) && primary_world && online > 0
    }

    pub fn admit_join(&self) -> bool {
        self.config.is_enabled(SnapshotCause::PlayerJoin)
    }

    /// Only a fully restored session is captured on quit.
    pub fn admit_quit(&self, player: &PlayerId) -> bool {
        self.admit(SnapshotCause::PlayerQuit, player)
    }

    pub fn admit_shutdown(&self) -> bool {
        self.config.is_enabled(SnapshotCause::PluginDisable)
    }

    /// Returns whether a capture was queued.
    pub fn on_death(&self, player: Arc<P>) -> bool {
        if !self.admit_death(&player.id()) {
            return false;
        }
        self.submit_capture(player, SnapshotCause::PlayerDeath)
    }

    pub fn on_game_mode_change(&self, player: Arc<P>) -> bool {
        if !self.admit_game_mode_change(&player.id()) {
            return false;
        }
        self.submit_capture(player, SnapshotCause::PlayerGameModeChange)
    }

    /// Snapshot everyone online after a world save. Players without a
    /// session here are captured through the snapshot-only path.
    pub fn on_world_save(&self, primary_world: bool, players: Vec<Arc<P>>) -> bool {
        if !self.admit_world_save(primary_world, players.len()) {
            return false;
        }

        let snapshots = self.snapshots.clone();
        let sessions = Arc::clone(&self.sessions);
        self.snapshots.pool().submit(move || {
            let (in_session, outside): (Vec<_>, Vec<_>) = players
                .iter()
                .partition(|p| sessions.get(&p.id()) == SessionState::Active);

            snapshots.create_many(in_session.into_iter().map(|p| p.as_ref()), SnapshotCause::WorldSave);

            for player in outside {
                let id = player.id();
                if !sessions.advance(id, SessionState::Idle, SessionState::SnapshotOnly) {
                    continue;
                }
                if let Err(e) = snapshots.create(player.as_ref(), SnapshotCause::WorldSave) {
                    tracing::error!(player = %player.name(), error = %e, "failed to snapshot player");
                }
                sessions.advance(id, SessionState::SnapshotOnly, SessionState::Idle);
            }
        })
    }

    fn submit_capture(&self, player: Arc<P>, cause: SnapshotCause) -> bool {
        let snapshots = self.snapshots.clone();
        let queued = self.snapshots.pool().submit(move || {
            if let Err(e) = snapshots.create(player.as_ref(), cause) {
                tracing::error!(
                    cause = %cause,
                    player = %player.name(),
                    error = %e,
                    "failed to snapshot player"
                );
            }
        });
        if !queued {
            tracing::warn!(cause = %cause, "worker pool closed, capture dropped");
        }
        queued
    }

    /// End a session: final snapshot, then give the lock back.
    ///
    /// The lock is released even when the capture fails. A release failure
    /// is reported before a capture failure. A quit during a join takes no
    /// snapshot; the join sees the session is releasing and cleans up.
    pub fn quit(&self, player: &P) -> Result<Option<SnapshotId>, SyncError> {
        let id = player.id();
        match self.sessions.begin_release(id) {
            SessionState::Active => {}
            state @ (SessionState::Locking | SessionState::Restoring) => {
                tracing::debug!(player = %player.name(), state = %state, "quit during join");
                self.locks.release(&id)?;
                return Ok(None);
            }
            _ => {
                self.locks.release(&id)?;
                return Ok(None);
            }
        }

        let admitted =
            self.config.is_enabled(SnapshotCause::PlayerQuit) && !self.is_restoring(&id);
        let captured = if admitted {
            Some(self.snapshots.create(player, SnapshotCause::PlayerQuit))
        } else {
            tracing::debug!(player = %player.name(), "quit snapshot skipped");
            None
        };

        let released = self.locks.release(&id);
        self.end_session(&id);
        released?;

        match captured {
            Some(result) => Ok(Some(result?)),
            None => Ok(None),
        }
    }

    /// Final pass before the process exits: snapshot everyone in session,
    /// drain the worker pool, then release their locks.
    ///
    /// No capture job is still running once a lock is released.
    pub fn shutdown(&self, players: &[Arc<P>]) -> ShutdownReport {
        let active: Vec<&P> = players
            .iter()
            .filter(|p| self.state(&p.id()) == SessionState::Active)
            .map(|p| p.as_ref())
            .collect();

        for player in &active {
            self.sessions.set(player.id(), SessionState::Releasing);
        }

        let captured = if self.admit_shutdown() {
            self.snapshots
                .create_many(active.iter().copied(), SnapshotCause::PluginDisable)
        } else {
            0
        };

        let workers = self.snapshots.pool().shutdown();

        let mut released = 0;
        for player in &active {
            if self.release_quietly(player) {
                released += 1;
            }
            self.end_session(&player.id());
        }

        // sessions for players no longer in the online list
        for id in self.sessions.with_state(SessionState::Active) {
            if let Err(e) = self.locks.release(&id) {
                tracing::error!(player_id = %id, error = %e, "failed to release lock");
            }
            self.end_session(&id);
        }

        tracing::info!(captured, released, jobs = workers.jobs_completed, "sync shut down");

        ShutdownReport {
            captured,
            released,
            workers,
        }
    }

    fn release_quietly(&self, player: &P) -> bool {
        match self.locks.release(&player.id()) {
            Ok(released) => released,
            Err(e) => {
                tracing::error!(player = %player.name(), error = %e, "failed to release lock");
                false
            }
        }
    }

    fn end_session(&self, player: &PlayerId) {
        self.sessions.set(*player, SessionState::Idle);
        self.markers().forget(player);
    }
}
