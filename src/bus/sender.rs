use super::{BusError, Message};

/// Sends a message to one named queue (point-to-point).
pub trait Sender: Send + Sync {
    fn send(&self, queue: &str, message: Message) -> Result<(), BusError>;
}
