use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a snapshot was taken. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotCause {
    WorldSave,
    PlayerDeath,
    PlayerGameModeChange,
    /// Process shutdown; quit events do not fire for players still online.
    PluginDisable,
    PlayerJoin,
    PlayerQuit,
}

impl SnapshotCause {
    pub const ALL: [SnapshotCause; 6] = [
        SnapshotCause::WorldSave,
        SnapshotCause::PlayerDeath,
        SnapshotCause::PlayerGameModeChange,
        SnapshotCause::PluginDisable,
        SnapshotCause::PlayerJoin,
        SnapshotCause::PlayerQuit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotCause::WorldSave => "WORLD_SAVE",
            SnapshotCause::PlayerDeath => "PLAYER_DEATH",
            SnapshotCause::PlayerGameModeChange => "PLAYER_GAME_MODE_CHANGE",
            SnapshotCause::PluginDisable => "PLUGIN_DISABLE",
            SnapshotCause::PlayerJoin => "PLAYER_JOIN",
            SnapshotCause::PlayerQuit => "PLAYER_QUIT",
        }
    }
}

impl fmt::Display for SnapshotCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
