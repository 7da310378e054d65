use std::collections::VecDeque;
use std::sync::Mutex;

use crate::models::Snapshot;

/// Keep the last 100 data points.
pub const HISTORY_MAX_POINTS: usize = 100;

/// Thread-safe bounded ring of snapshots, newest last. One mutex guards both
/// mutation and view construction so readers never observe a snapshot that
/// is still being filled.
pub struct HistoryStore {
    snapshots: Mutex<VecDeque<Snapshot>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::with_capacity(HISTORY_MAX_POINTS + 1)),
        }
    }

    /// Append a fully-built snapshot, evicting the oldest entry past the cap.
    pub fn append(&self, snapshot: Snapshot) {
        let mut snapshots = self.snapshots.lock().expect("history lock poisoned");
        snapshots.push_back(snapshot);
        while snapshots.len() > HISTORY_MAX_POINTS {
            snapshots.pop_front();
        }
    }

    /// Copy-on-read view of the retained snapshots, oldest first.
    pub fn snapshot_view(&self) -> Vec<Snapshot> {
        let snapshots = self.snapshots.lock().expect("history lock poisoned");
        snapshots.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
