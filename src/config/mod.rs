//! Runtime configuration.
//!
//! Loaded from a JSON document; every field has a default so an empty
//! object is a valid configuration.
//!
//! ```json
//! {
//!   "snapshot": { "when": ["PLAYER_QUIT", "WORLD_SAVE"], "capacity": 45, "keep_days": 7 },
//!   "lock": { "query_timeout_ms": 1500, "query_retries": 2 },
//!   "workers": 2
//! }
//! ```

mod error;

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lock::LockSettings;
use crate::retention::RetentionPolicy;
use crate::snapshot::SnapshotCause;

pub use error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub snapshot: SnapshotConfig,
    pub lock: LockConfig,
    /// Background threads for captures and retention sweeps.
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig::default(),
            lock: LockConfig::default(),
            workers: 2,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot.capacity == 0 {
            return Err(ConfigError::Invalid("snapshot.capacity must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.lock.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid("lock.query_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Causes that trigger a capture.
    pub when: BTreeSet<SnapshotCause>,
    pub capacity: u32,
    pub keep_days: u32,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            when: SnapshotCause::ALL.into_iter().collect(),
            capacity: 45,
            keep_days: 7,
        }
    }
}

impl SnapshotConfig {
    pub fn is_enabled(&self, cause: SnapshotCause) -> bool {
        self.when.contains(&cause)
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.capacity as usize, self.keep_days)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub query_timeout_ms: u64,
    pub query_retries: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        let settings = LockSettings::default();
        Self {
            query_timeout_ms: settings.query_timeout.as_millis() as u64,
            query_retries: settings.query_retries,
        }
    }
}

impl LockConfig {
    pub fn settings(&self) -> LockSettings {
        LockSettings {
            query_timeout: Duration::from_millis(self.query_timeout_ms),
            query_retries: self.query_retries,
        }
    }
}
