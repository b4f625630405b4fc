use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::id::PlayerId;

/// Per-player "restore pending" flags, local to this process.
///
/// Set for the whole time a restore is applying components; read by capture
/// admission and by event handlers that must ignore side effects of the
/// restore itself.
#[derive(Default)]
pub struct RestoreMarkers {
    flags: RwLock<HashMap<PlayerId, Arc<AtomicBool>>>,
}

/// Clears its player's marker when dropped.
pub struct RestoreGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl RestoreMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `player` as restoring until the returned guard is dropped.
    pub fn begin(&self, player: &PlayerId) -> RestoreGuard {
        let flag = self.flag(player);
        flag.store(true, Ordering::SeqCst);
        RestoreGuard { flag }
    }

    pub fn is_restoring(&self, player: &PlayerId) -> bool {
        let flags = match self.flags.read() {
            Ok(flags) => flags,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags
            .get(player)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Drop the player's entry once their session is over.
    pub fn forget(&self, player: &PlayerId) {
        let mut flags = match self.flags.write() {
            Ok(flags) => flags,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(flag) = flags.get(player) {
            if !flag.load(Ordering::SeqCst) {
                flags.remove(player);
            }
        }
    }

    fn flag(&self, player: &PlayerId) -> Arc<AtomicBool> {
        let mut flags = match self.flags.write() {
            Ok(flags) => flags,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(flags.entry(*player).or_default())
    }
}
