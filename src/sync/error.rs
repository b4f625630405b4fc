use std::fmt;

use crate::id::PlayerId;
use crate::lock::LockError;
use crate::repository::RepositoryError;
use crate::snapshot::CaptureError;

/// Coarse reason for a failed session operation, for user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Another server still has the player.
    Contention,
    /// Another server did not answer in time.
    Timeout,
    /// The message bus failed.
    Transport,
    /// A table read or write failed.
    Persistence,
    /// The operation is not allowed in the player's current state.
    Admission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Capture(CaptureError),
    Lock(LockError),
    Repository(RepositoryError),
    /// The player already has a session on this server.
    SessionActive(PlayerId),
    /// The player quit before their join finished.
    JoinAborted(PlayerId),
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Lock(LockError::Contention { .. }) => FailureKind::Contention,
            SyncError::Lock(LockError::Timeout { .. }) => FailureKind::Timeout,
            SyncError::Lock(LockError::Transport(_)) => FailureKind::Transport,
            SyncError::Lock(LockError::Repository(_)) => FailureKind::Persistence,
            SyncError::Capture(CaptureError::Repository(_)) => FailureKind::Persistence,
            SyncError::Repository(_) => FailureKind::Persistence,
            SyncError::Capture(_) | SyncError::SessionActive(_) | SyncError::JoinAborted(_) => {
                FailureKind::Admission
            }
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Lock(e @ LockError::Contention { .. }) => write!(
                f,
                "your data is still in use on another server, try again in a moment ({})",
                e
            ),
            SyncError::Lock(e @ LockError::Timeout { .. }) => write!(
                f,
                "could not reach the server holding your data ({})",
                e
            ),
            SyncError::Lock(e) => write!(f, "could not lock your data ({})", e),
            SyncError::Capture(e) => write!(f, "snapshot refused: {}", e),
            SyncError::Repository(e) => write!(f, "could not load your data ({})", e),
            SyncError::SessionActive(player) => {
                write!(f, "player {} already has a session on this server", player)
            }
            SyncError::JoinAborted(player) => {
                write!(f, "player {} left before their session started", player)
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Capture(e) => Some(e),
            SyncError::Lock(e) => Some(e),
            SyncError::Repository(e) => Some(e),
            SyncError::SessionActive(_) | SyncError::JoinAborted(_) => None,
        }
    }
}

impl From<CaptureError> for SyncError {
    fn from(err: CaptureError) -> Self {
        SyncError::Capture(err)
    }
}

impl From<LockError> for SyncError {
    fn from(err: LockError) -> Self {
        SyncError::Lock(err)
    }
}

impl From<RepositoryError> for SyncError {
    fn from(err: RepositoryError) -> Self {
        SyncError::Repository(err)
    }
}
