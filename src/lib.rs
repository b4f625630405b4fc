//! Player state synchronization across a fleet of game servers sharing one
//! database.
//!
//! A player is owned by at most one server at a time ([`lock`]). While
//! owned, their state is captured into point-in-time snapshots split across
//! category providers ([`snapshot`], [`provider`]) and trimmed to a bounded
//! history ([`retention`]). [`sync`] ties these into the join / play / quit
//! session lifecycle.

pub mod bus;
pub mod clock;
pub mod config;
pub mod id;
pub mod lock;
pub mod player;
pub mod provider;
pub mod repository;
pub mod retention;
pub mod snapshot;
pub mod sync;
pub mod worker;

pub use bus::{BusError, InMemoryChannel, Listener, Message, Sender};
pub use clock::{Clock, FixedClock, LocalClock};
pub use config::{ConfigError, LockConfig, SnapshotConfig, SyncConfig};
pub use id::{PlayerId, ServerId, SnapshotId};
pub use lock::{
    BusLockTransport, InMemoryLockStore, LockCoordinator, LockError, LockRecord,
    LockResponderThread, LockSettings, LockStore, LockTransport,
};
pub use player::Player;
pub use provider::{
    CachedProvider, Category, ComponentSource, ComponentTable, Priority, ProviderError,
    ProviderRegistry, SnapshotProvider,
};
pub use repository::RepositoryError;
pub use retention::RetentionPolicy;
pub use snapshot::{
    CaptureError, InMemorySnapshotStore, RemoveError, RestoreReport, Snapshot, SnapshotCause,
    SnapshotManager, SnapshotStore,
};
pub use sync::{FailureKind, RestoreMarkers, SessionState, SyncError, SyncOrchestrator};
pub use worker::{WorkerPool, WorkerStats};
