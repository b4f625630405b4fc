use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::id::{PlayerId, ServerId};

/// One row of the lock table, keyed by player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub player_id: PlayerId,
    pub server_id: ServerId,
    pub created_at: NaiveDateTime,
}

impl LockRecord {
    pub fn new(player_id: PlayerId, server_id: ServerId, created_at: NaiveDateTime) -> Self {
        Self {
            player_id,
            server_id,
            created_at,
        }
    }

    pub fn is_owned_by(&self, server: &ServerId) -> bool {
        &self.server_id == server
    }
}
