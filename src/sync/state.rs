use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Locking,
    Restoring,
    Active,
    Releasing,
    /// A capture for a player with no session (e.g. a world-save sweep).
    SnapshotOnly,
}

impl SessionState {
    /// Whether captures may be taken for the player in this state.
    ///
    /// `Releasing` is refused: it also marks a join cut short by a quit,
    /// where the player's state was never restored.
    pub fn accepts_capture(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Locking => "locking",
            SessionState::Restoring => "restoring",
            SessionState::Active => "active",
            SessionState::Releasing => "releasing",
            SessionState::SnapshotOnly => "snapshot-only",
        };
        f.write_str(name)
    }
}
