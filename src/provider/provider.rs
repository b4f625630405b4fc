use crate::id::SnapshotId;

use super::{Category, ProviderError};

/// Uniform contract every capture provider exposes to the core.
///
/// `P` is the host's player handle. Implementations own their component
/// storage; they are only ever called with ids whose header already exists.
pub trait SnapshotProvider<P>: Send + Sync {
    /// Identity used in logs (plugin or module name).
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// Capture the player's current state for this category under `snapshot_id`.
    fn save(&self, snapshot_id: SnapshotId, player: &P) -> Result<(), ProviderError>;

    /// Apply the component stored under `snapshot_id` to the player.
    ///
    /// Returns `Ok(false)` when there is no component for this category,
    /// which is normal for new players.
    fn restore(&self, snapshot_id: SnapshotId, player: &P) -> Result<bool, ProviderError>;

    /// Delete this category's components for every id in `snapshot_ids`.
    fn remove(&self, snapshot_ids: &[SnapshotId]) -> Result<(), ProviderError>;

    /// Whether a component exists for `snapshot_id`.
    fn contains(&self, snapshot_id: SnapshotId) -> Result<bool, ProviderError>;
}
