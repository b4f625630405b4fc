use std::error::Error;
use std::fmt;

/// Error type for bus operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Connection to the transport failed
    ConnectionFailed(String),
    /// Encoding or decoding a payload failed
    SerializationFailed(String),
    /// The transport refused the message
    Rejected(String),
    /// Timeout waiting on the transport
    Timeout,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            BusError::SerializationFailed(msg) => write!(f, "serialization failed: {}", msg),
            BusError::Rejected(msg) => write!(f, "message rejected: {}", msg),
            BusError::Timeout => write!(f, "bus timeout"),
        }
    }
}

impl Error for BusError {}

impl From<bitcode::Error> for BusError {
    fn from(err: bitcode::Error) -> Self {
        BusError::SerializationFailed(err.to_string())
    }
}
