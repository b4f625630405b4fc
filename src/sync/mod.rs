//! Per-player session lifecycle on this server.
//!
//! ```text
//! Idle ─▶ Locking ─▶ Restoring ─▶ Active ─▶ Releasing ─▶ Idle
//!   └──▶ SnapshotOnly ─▶ Idle        (captures outside a session)
//! ```
//!
//! Joining takes the cross-server lock and applies the latest snapshot;
//! leaving takes a final snapshot and always gives the lock back. While a
//! restore is applying, every capture for that player is refused.

mod error;
mod markers;
mod orchestrator;
mod state;

pub use error::{FailureKind, SyncError};
pub use markers::{RestoreGuard, RestoreMarkers};
pub use orchestrator::{ShutdownReport, SyncOrchestrator};
pub use state::SessionState;
