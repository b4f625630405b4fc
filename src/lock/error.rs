use std::fmt;

use crate::bus::BusError;
use crate::id::{PlayerId, ServerId};
use crate::repository::RepositoryError;

/// Why ownership of a player could not be taken or given up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The owning server reports the player is still active there.
    Contention { player: PlayerId, owner: ServerId },
    /// The owning server never answered; acquisition fails closed.
    Timeout {
        player: PlayerId,
        owner: ServerId,
        attempts: u32,
    },
    /// The lock table could not be read or written.
    Repository(RepositoryError),
    /// The bus refused or failed to carry the query.
    Transport(BusError),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Contention { player, owner } => write!(
                f,
                "player {} is still active on server {}",
                player, owner
            ),
            LockError::Timeout {
                player,
                owner,
                attempts,
            } => write!(
                f,
                "server {} did not confirm release of player {} after {} attempt(s)",
                owner, player, attempts
            ),
            LockError::Repository(e) => write!(f, "lock table error: {}", e),
            LockError::Transport(e) => write!(f, "lock transport error: {}", e),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Repository(e) => Some(e),
            LockError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RepositoryError> for LockError {
    fn from(err: RepositoryError) -> Self {
        LockError::Repository(err)
    }
}

impl From<BusError> for LockError {
    fn from(err: BusError) -> Self {
        LockError::Transport(err)
    }
}
