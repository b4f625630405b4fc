use std::fmt;

use crate::id::PlayerId;
use crate::provider::Category;
use crate::repository::RepositoryError;

/// Why a snapshot could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The player's state is still being restored; a snapshot now would
    /// record half-applied state.
    RestoreInProgress(PlayerId),
    /// The player has no active session on this server.
    NoSession(PlayerId),
    /// The header could not be written.
    Repository(RepositoryError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::RestoreInProgress(player) => write!(
                f,
                "player {} is still being restored, snapshot refused",
                player
            ),
            CaptureError::NoSession(player) => {
                write!(f, "player {} has no active session on this server", player)
            }
            CaptureError::Repository(e) => write!(f, "snapshot header error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Repository(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RepositoryError> for CaptureError {
    fn from(err: RepositoryError) -> Self {
        CaptureError::Repository(err)
    }
}

/// Why a set of snapshots could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveError {
    /// These providers failed to delete their components; headers were kept
    /// so the whole set is retried. `removed` lists the categories already
    /// gone for those snapshots.
    Incomplete {
        providers: Vec<String>,
        removed: Vec<Category>,
    },
    Repository(RepositoryError),
}

impl fmt::Display for RemoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveError::Incomplete { providers, removed } => {
                write!(f, "component removal failed in: {}", providers.join(", "))?;
                if !removed.is_empty() {
                    let removed: Vec<&str> = removed.iter().map(|c| c.as_str()).collect();
                    write!(f, " (already removed: {})", removed.join(", "))?;
                }
                Ok(())
            }
            RemoveError::Repository(e) => write!(f, "snapshot header error: {}", e),
        }
    }
}

impl std::error::Error for RemoveError {}

impl From<RepositoryError> for RemoveError {
    fn from(err: RepositoryError) -> Self {
        RemoveError::Repository(err)
    }
}
