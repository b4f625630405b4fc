use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::id::SnapshotId;
use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum snapshots kept per player.
    pub capacity: usize,
    /// Days before `today` (plus today) in which each day keeps its last snapshot.
    pub keep_days: u32,
}

impl RetentionPolicy {
    pub fn new(capacity: usize, keep_days: u32) -> Self {
        Self {
            capacity,
            keep_days,
        }
    }

    /// First day whose last snapshot is protected.
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.keep_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Ids to delete from `history` so that it fits the policy.
    ///
    /// Days are visited oldest first and each day oldest first. Days before
    /// the window are drained freely; days inside it give up everything but
    /// their last snapshot. Stops as soon as the excess is covered, so the
    /// result may leave more than `capacity` when the floor protects the rest.
    pub fn plan(&self, history: &[Snapshot], today: NaiveDate) -> Vec<SnapshotId> {
        let mut excess = history.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }

        let mut days: BTreeMap<NaiveDate, Vec<&Snapshot>> = BTreeMap::new();
        for snapshot in history {
            days.entry(snapshot.day()).or_default().push(snapshot);
        }

        let window_start = self.window_start(today);
        let mut removing = Vec::with_capacity(excess);

        for (day, mut snapshots) in days {
            if excess == 0 {
                break;
            }
            snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

            let removable = if day < window_start {
                snapshots.len()
            } else {
                snapshots.len() - 1
            };

            for snapshot in snapshots.iter().take(removable.min(excess)) {
                removing.push(snapshot.id);
            }
            excess -= removable.min(excess);
        }

        removing
    }
}
