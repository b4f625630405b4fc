use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::bus::{BusError, Listener, Message, Sender};
use crate::id::{PlayerId, ServerId};

use super::protocol::{query_queue, reply_queue, LockQuery, LockReply, LOCK_QUERY, LOCK_REPLY};

/// Request/response channel to one specific remote server.
pub trait LockTransport: Send + Sync {
    /// Ask `target` whether `player` is free there.
    ///
    /// `Ok(Some(available))` is the remote's answer; `Ok(None)` means no
    /// answer arrived within `timeout`.
    fn query(
        &self,
        target: &ServerId,
        player: &PlayerId,
        timeout: Duration,
    ) -> Result<Option<bool>, BusError>;
}

/// `LockTransport` over any point-to-point bus.
///
/// Concurrent queries share this server's reply queue. A reply picked up by
/// the wrong waiter is parked until its owner collects it; replies to queries
/// nobody is waiting on any more are dropped.
pub struct BusLockTransport<B> {
    local: ServerId,
    bus: B,
    outstanding: Mutex<HashSet<String>>,
    parked: Mutex<HashMap<String, LockReply>>,
    poll_slice: Duration,
}

impl<B: Sender + Listener> BusLockTransport<B> {
    pub fn new(local: ServerId, bus: B) -> Self {
        Self {
            local,
            bus,
            outstanding: Mutex::new(HashSet::new()),
            parked: Mutex::new(HashMap::new()),
            poll_slice: Duration::from_millis(25),
        }
    }

    pub fn local(&self) -> &ServerId {
        &self.local
    }

    fn take_parked(&self, correlation_id: &str) -> Option<LockReply> {
        self.parked.lock().ok()?.remove(correlation_id)
    }

    fn park(&self, reply: LockReply) {
        let waiting = self
            .outstanding
            .lock()
            .map(|set| set.contains(&reply.correlation_id))
            .unwrap_or(false);
        if !waiting {
            tracing::debug!(
                correlation_id = %reply.correlation_id,
                player = %reply.player_id,
                "dropping late lock reply"
            );
            return;
        }
        if let Ok(mut parked) = self.parked.lock() {
            parked.insert(reply.correlation_id.clone(), reply);
        }
    }

    fn finish(&self, correlation_id: &str) {
        if let Ok(mut set) = self.outstanding.lock() {
            set.remove(correlation_id);
        }
        if let Ok(mut parked) = self.parked.lock() {
            parked.remove(correlation_id);
        }
    }

    fn await_reply(&self, correlation_id: &str, timeout: Duration) -> Result<Option<bool>, BusError> {
        let deadline = Instant::now() + timeout;
        let queue = reply_queue(&self.local);

        loop {
            if let Some(reply) = self.take_parked(correlation_id) {
                return Ok(Some(reply.available));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let slice = self.poll_slice.min(deadline - now);
            let Some(message) = self.bus.listen(&queue, slice.as_millis() as u64)? else {
                continue;
            };
            if message.message_type != LOCK_REPLY {
                continue;
            }

            let reply: LockReply = match message.decode() {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(message_id = %message.id, error = %e, "undecodable lock reply");
                    continue;
                }
            };

            if reply.correlation_id == correlation_id {
                return Ok(Some(reply.available));
            }
            self.park(reply);
        }
    }
}

impl<B: Sender + Listener> LockTransport for BusLockTransport<B> {
    fn query(
        &self,
        target: &ServerId,
        player: &PlayerId,
        timeout: Duration,
    ) -> Result<Option<bool>, BusError> {
        let correlation_id = Uuid::new_v4().to_string();
        let query = LockQuery {
            correlation_id: correlation_id.clone(),
            player_id: *player,
            from: self.local,
        };
        let message = Message::encode(correlation_id.clone(), LOCK_QUERY, &query)?
            .with_metadata("to", target.to_string());

        if let Ok(mut set) = self.outstanding.lock() {
            set.insert(correlation_id.clone());
        }

        let result = self
            .bus
            .send(&query_queue(target), message)
            .and_then(|()| self.await_reply(&correlation_id, timeout));
        self.finish(&correlation_id);
        result
    }
}
