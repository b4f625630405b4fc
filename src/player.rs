use crate::id::PlayerId;

/// Handle to a connected player as the host server exposes it.
///
/// Providers read live state from it when capturing and write back into it
/// when restoring; the core itself only needs identity.
pub trait Player: Send + Sync {
    fn id(&self) -> PlayerId;

    fn name(&self) -> &str;
}
