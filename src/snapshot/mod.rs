//! Snapshot headers and the capture / restore / removal flows over them.
//!
//! A header row is written before any provider sees its id, and removal
//! takes headers and every provider's components away together.

mod cause;
mod error;
mod in_memory;
mod manager;
mod record;
mod store;

pub use cause::SnapshotCause;
pub use error::{CaptureError, RemoveError};
pub use in_memory::InMemorySnapshotStore;
pub use manager::{RestoreReport, SnapshotManager};
pub use record::Snapshot;
pub use store::SnapshotStore;
