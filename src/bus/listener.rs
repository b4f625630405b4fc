use super::{BusError, Message};

/// Consumes messages from one named queue.
///
/// Each message is delivered to exactly one listener on that queue.
pub trait Listener: Send + Sync {
    /// Wait for the next message on `queue`, up to `timeout_ms`.
    fn listen(&self, queue: &str, timeout_ms: u64) -> Result<Option<Message>, BusError>;
}
