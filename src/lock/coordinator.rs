use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::bus::BusError;
use crate::clock::Clock;
use crate::id::{PlayerId, ServerId};
use crate::repository::RepositoryError;

use super::{LockError, LockQuery, LockRecord, LockReply, LockStore, LockTransport};

/// Conditional-write attempts before a claim gives up as contention.
const CLAIM_ROUNDS: u32 = 3;

/// Tuning for remote ownership queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockSettings {
    pub query_timeout: Duration,
    /// Extra attempts after the first unanswered query.
    pub query_retries: u32,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_millis(1_500),
            query_retries: 2,
        }
    }
}

/// Decides which server owns each player.
///
/// Holds this process's in-memory roster of owned players next to the
/// persisted lock table. The roster is what remote queries are answered
/// from: a row alone does not prove the player is still active here.
pub struct LockCoordinator {
    server_id: ServerId,
    store: Arc<dyn LockStore>,
    transport: Arc<dyn LockTransport>,
    clock: Arc<dyn Clock>,
    settings: LockSettings,
    owned: RwLock<HashSet<PlayerId>>,
}

impl LockCoordinator {
    pub fn new(
        server_id: ServerId,
        store: Arc<dyn LockStore>,
        transport: Arc<dyn LockTransport>,
        clock: Arc<dyn Clock>,
        settings: LockSettings,
    ) -> Self {
        Self {
            server_id,
            store,
            transport,
            clock,
            settings,
            owned: RwLock::new(HashSet::new()),
        }
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    /// Claim `player` for this server.
    ///
    /// Free players and players already claimed by this server are taken
    /// directly. A row held by another server is only taken over once that
    /// server confirms the player is no longer active there.
    ///
    /// Every claim is a conditional write against the row that was read, so
    /// two servers racing for the same player cannot both win. The loser
    /// re-reads and goes through the ownership query against the winner.
    pub fn acquire(&self, player: &PlayerId) -> Result<(), LockError> {
        let mut last_owner = None;
        for round in 1..=CLAIM_ROUNDS {
            let claimed = match self.store.get(player)? {
                None => self.claim_with(player, |store, record| store.insert_if_absent(record))?,
                Some(existing) if existing.is_owned_by(&self.server_id) => self
                    .claim_with(player, |store, record| {
                        store.replace_if_owner(record, &self.server_id)
                    })?,
                Some(existing) => {
                    let owner = existing.server_id;
                    last_owner = Some(owner);
                    self.confirm_released(player, &owner)?;
                    self.claim_with(player, |store, record| {
                        store.replace_if_owner(record, &owner)
                    })?
                }
            };
            if claimed {
                tracing::debug!(player = %player, server = %self.server_id, "lock acquired");
                return Ok(());
            }
            tracing::debug!(player = %player, round, "lock row changed under claim, re-reading");
        }

        let owner = match self.store.get(player)? {
            Some(row) => row.server_id,
            None => last_owner.unwrap_or(self.server_id),
        };
        tracing::warn!(player = %player, owner = %owner, "lost lock race");
        Err(LockError::Contention {
            player: *player,
            owner,
        })
    }

    /// `acquire` that folds contention and unanswered queries into `false`.
    ///
    /// Persistence and transport failures are still returned as errors.
    pub fn try_acquire(&self, player: &PlayerId) -> Result<bool, LockError> {
        match self.acquire(player) {
            Ok(()) => Ok(true),
            Err(LockError::Contention { .. } | LockError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Drop this server's claim on `player`. Returns false if there was none.
    pub fn release(&self, player: &PlayerId) -> Result<bool, LockError> {
        self.owned_mut()?.remove(player);
        let removed = self.store.delete(player, &self.server_id)?;
        if removed {
            tracing::debug!(player = %player, server = %self.server_id, "lock released");
        }
        Ok(removed)
    }

    /// Re-assert rows for every player this process still hosts.
    ///
    /// Run once at start-up. Rows left behind by this server's previous run
    /// (a different server id) are overwritten without asking anyone, since
    /// the players are demonstrably here now.
    pub fn reconcile_on_startup<I>(&self, players: I) -> Result<usize, LockError>
    where
        I: IntoIterator<Item = PlayerId>,
    {
        let mut count = 0;
        for player in players {
            self.store
                .upsert(LockRecord::new(player, self.server_id, self.clock.now()))?;
            self.owned_mut()?.insert(player);
            count += 1;
        }
        tracing::info!(server = %self.server_id, players = count, "re-asserted player locks");
        Ok(count)
    }

    /// Admin override: delete the player's row whoever holds it.
    pub fn force_unlock(&self, player: &PlayerId) -> Result<usize, LockError> {
        self.owned_mut()?.remove(player);
        let removed = self.store.delete_by_player(player)?;
        tracing::warn!(player = %player, rows = removed, "lock force-removed");
        Ok(removed)
    }

    /// Admin reset: drop every lock row on every server.
    pub fn reset_all(&self) -> Result<usize, LockError> {
        self.owned_mut()?.clear();
        let removed = self.store.delete_all()?;
        tracing::warn!(server = %self.server_id, rows = removed, "all locks removed");
        Ok(removed)
    }

    /// Rows persisted under this server's id.
    pub fn held_rows(&self) -> Result<Vec<LockRecord>, LockError> {
        Ok(self.store.list_by_server(&self.server_id)?)
    }

    pub fn is_owned(&self, player: &PlayerId) -> bool {
        self.owned
            .read()
            .map(|owned| owned.contains(player))
            .unwrap_or(false)
    }

    pub fn owned_players(&self) -> Vec<PlayerId> {
        self.owned
            .read()
            .map(|owned| owned.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Answer a remote server's ownership query from the local roster.
    ///
    /// An unreadable roster answers "busy".
    pub fn answer(&self, query: &LockQuery) -> LockReply {
        let available = match self.owned.read() {
            Ok(owned) => !owned.contains(&query.player_id),
            Err(_) => {
                tracing::error!(player = %query.player_id, "owned roster poisoned, reporting player busy");
                false
            }
        };
        LockReply {
            correlation_id: query.correlation_id.clone(),
            player_id: query.player_id,
            from: self.server_id,
            available,
        }
    }

    /// Run one conditional write for `player`, keeping the roster in step.
    ///
    /// The roster entry goes in first so a remote query racing the write is
    /// answered "busy". It is taken back out if the write loses, unless the
    /// player was already on the roster.
    fn claim_with<F>(&self, player: &PlayerId, write: F) -> Result<bool, LockError>
    where
        F: FnOnce(&dyn LockStore, LockRecord) -> Result<bool, RepositoryError>,
    {
        let newly_owned = self.owned_mut()?.insert(*player);
        let record = LockRecord::new(*player, self.server_id, self.clock.now());
        let won = match write(self.store.as_ref(), record) {
            Ok(won) => won,
            Err(e) => {
                if newly_owned {
                    self.owned_mut()?.remove(player);
                }
                return Err(e.into());
            }
        };
        if !won && newly_owned {
            self.owned_mut()?.remove(player);
        }
        Ok(won)
    }

    fn confirm_released(&self, player: &PlayerId, owner: &ServerId) -> Result<(), LockError> {
        let attempts = self.settings.query_retries + 1;
        let mut last_error: Option<BusError> = None;

        for attempt in 1..=attempts {
            match self
                .transport
                .query(owner, player, self.settings.query_timeout)
            {
                Ok(Some(true)) => return Ok(()),
                Ok(Some(false)) => {
                    tracing::warn!(player = %player, owner = %owner, "player still active on another server");
                    return Err(LockError::Contention {
                        player: *player,
                        owner: *owner,
                    });
                }
                Ok(None) => {
                    tracing::warn!(player = %player, owner = %owner, attempt, "lock query timed out");
                    last_error = None;
                }
                Err(e) => {
                    tracing::warn!(player = %player, owner = %owner, attempt, error = %e, "lock query failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => LockError::Transport(e),
            None => LockError::Timeout {
                player: *player,
                owner: *owner,
                attempts,
            },
        })
    }

    fn owned_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashSet<PlayerId>>, LockError> {
        self.owned
            .write()
            .map_err(|_| LockError::Repository(RepositoryError::LockPoisoned("owned roster")))
    }
}
