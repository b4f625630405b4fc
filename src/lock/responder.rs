//! Background thread answering ownership queries from other servers.

use std::sync::mpsc::{channel, Sender as StopSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bus::{BusError, Listener, Message, Sender};

use super::protocol::{query_queue, reply_queue, LockQuery, LOCK_QUERY, LOCK_REPLY};
use super::LockCoordinator;

/// Statistics from the responder thread.
#[derive(Debug, Default, Clone)]
pub struct ResponderStats {
    pub queries_answered: usize,
    pub queries_failed: usize,
    pub polls: usize,
}

/// Listens on this server's lock query queue and replies from the
/// coordinator's roster. Spawn, run, `stop()` to collect stats.
pub struct LockResponderThread {
    stop_tx: StopSender<()>,
    handle: Option<JoinHandle<ResponderStats>>,
}

impl LockResponderThread {
    pub fn spawn<B>(coordinator: Arc<LockCoordinator>, bus: B, poll_interval: Duration) -> Self
    where
        B: Sender + Listener + 'static,
    {
        let (stop_tx, stop_rx) = channel();
        let queue = query_queue(coordinator.server_id());

        let handle = thread::spawn(move || {
            let mut stats = ResponderStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                match bus.listen(&queue, poll_interval.as_millis() as u64) {
                    Ok(Some(message)) if message.message_type == LOCK_QUERY => {
                        match reply(&coordinator, &bus, &message) {
                            Ok(()) => stats.queries_answered += 1,
                            Err(e) => {
                                tracing::warn!(message_id = %message.id, error = %e, "failed to answer lock query");
                                stats.queries_failed += 1;
                            }
                        }
                    }
                    Ok(Some(message)) => {
                        tracing::debug!(message_type = %message.message_type, "ignoring message on lock queue");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "lock queue listen failed");
                        thread::sleep(poll_interval);
                    }
                }
            }

            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Signal the responder to stop and wait for it to finish.
    pub fn stop(mut self) -> ResponderStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => ResponderStats::default(),
        }
    }
}

impl Drop for LockResponderThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

fn reply<B: Sender>(coordinator: &LockCoordinator, bus: &B, message: &Message) -> Result<(), BusError> {
    let query: LockQuery = message.decode()?;
    let answer = coordinator.answer(&query);
    let out = Message::encode(answer.correlation_id.clone(), LOCK_REPLY, &answer)?
        .with_metadata("to", query.from.to_string());
    bus.send(&reply_queue(&query.from), out)
}
