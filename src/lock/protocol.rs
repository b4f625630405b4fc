//! Wire format of the lock query protocol.
//!
//! Every server listens on its own query queue. A query names the asking
//! server so the reply can be routed to that server's reply queue, and carries
//! a correlation id so late replies to abandoned queries can be told apart.

use serde::{Deserialize, Serialize};

use crate::id::{PlayerId, ServerId};

pub const LOCK_QUERY: &str = "lock.query";
pub const LOCK_REPLY: &str = "lock.reply";

/// Queue on which `server` answers ownership queries.
pub fn query_queue(server: &ServerId) -> String {
    format!("playersync:lock.{}", server)
}

/// Queue on which `server` receives answers to its own queries.
pub fn reply_queue(server: &ServerId) -> String {
    format!("playersync:lock-reply.{}", server)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockQuery {
    pub correlation_id: String,
    pub player_id: PlayerId,
    pub from: ServerId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockReply {
    pub correlation_id: String,
    pub player_id: PlayerId,
    pub from: ServerId,
    /// True when the answering server does not consider the player active.
    pub available: bool,
}
