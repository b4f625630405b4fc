//! Cross-server ownership of player records.
//!
//! A row in the lock table *is* the ownership claim: at most one row per
//! player, naming the server that may load and mutate that player's state.
//! Contention is settled by asking the current owner over the bus whether the
//! player is still active there, never by table-level locking alone.

mod coordinator;
mod error;
mod in_memory;
mod protocol;
mod record;
mod responder;
mod store;
mod transport;

pub use coordinator::{LockCoordinator, LockSettings};
pub use error::LockError;
pub use in_memory::InMemoryLockStore;
pub use protocol::{query_queue, reply_queue, LockQuery, LockReply, LOCK_QUERY, LOCK_REPLY};
pub use record::LockRecord;
pub use responder::{LockResponderThread, ResponderStats};
pub use store::LockStore;
pub use transport::{BusLockTransport, LockTransport};
