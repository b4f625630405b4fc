//! In-memory named queues for tests and single-process setups.
//!
//! Several "servers" in one test process share a single `InMemoryChannel`
//! (clones share the same queues), each listening on its own queue name.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use super::{BusError, Listener, Message, Sender};

#[derive(Default)]
struct Queues {
    queues: HashMap<String, VecDeque<Message>>,
    sent: usize,
}

/// Thread-safe set of named FIFO queues.
#[derive(Clone, Default)]
pub struct InMemoryChannel {
    inner: Arc<(Mutex<Queues>, Condvar)>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages waiting on `queue`.
    pub fn pending(&self, queue: &str) -> usize {
        self.inner
            .0
            .lock()
            .map(|q| q.queues.get(queue).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    /// Total number of messages ever sent through this channel.
    pub fn sent(&self) -> usize {
        self.inner.0.lock().map(|q| q.sent).unwrap_or(0)
    }
}

impl Sender for InMemoryChannel {
    fn send(&self, queue: &str, message: Message) -> Result<(), BusError> {
        let (lock, wake) = &*self.inner;
        let mut state = lock
            .lock()
            .map_err(|_| BusError::ConnectionFailed("channel poisoned".into()))?;
        state
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(message);
        state.sent += 1;
        wake.notify_all();
        Ok(())
    }
}

impl Listener for InMemoryChannel {
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Message>, BusError> {
        let (lock, wake) = &*self.inner;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut state = lock
            .lock()
            .map_err(|_| BusError::ConnectionFailed("channel poisoned".into()))?;

        loop {
            if let Some(message) = state.queues.get_mut(queue).and_then(VecDeque::pop_front) {
                return Ok(Some(message));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let (next, _) = wake
                .wait_timeout(state, deadline - now)
                .map_err(|_| BusError::ConnectionFailed("channel poisoned".into()))?;
            state = next;
        }
    }
}
