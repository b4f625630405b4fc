use std::fmt;

/// Failure of a header, lock, or component table operation.
///
/// These are surfaced synchronously from lock and capture paths; only the
/// retention sweep logs and drops them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    LockPoisoned(&'static str),
    Storage(String),
    Conflict(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::LockPoisoned(operation) => {
                write!(f, "repository lock poisoned during {}", operation)
            }
            RepositoryError::Storage(message) => write!(f, "storage error: {}", message),
            RepositoryError::Conflict(message) => write!(f, "conflict: {}", message),
        }
    }
}

impl std::error::Error for RepositoryError {}
