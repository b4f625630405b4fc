//! Point-to-point message bus between server processes.
//!
//! The lock protocol only needs "send this message to that server's queue"
//! and "wait on my own queue for a while". Framing, routing through a proxy,
//! and identity resolution belong to the transport behind these traits.
//!
//! ```text
//!   server A                         server B
//!   Sender::send("lock.B", query) ──▶ Listener::listen("lock.B")
//!   Listener::listen("lock-reply.A") ◀── Sender::send("lock-reply.A", reply)
//! ```

mod error;
mod in_memory;
mod listener;
mod message;
mod sender;

pub use error::BusError;
pub use in_memory::InMemoryChannel;
pub use listener::Listener;
pub use message::Message;
pub use sender::Sender;
