//! Differences between two snapshots, keyed by device file

use crate::entry::Entry;

fn contains(entries: &[Entry], device_file: &str) -> bool {
    entries.iter().any(|e| e.device_file == device_file)
}

/// Entries of `new` whose device is not in `old`
pub fn added(old: &[Entry], new: &[Entry]) -> Vec<Entry> {
    new.iter()
        .filter(|e| !contains(old, &e.device_file))
        .cloned()
        .collect()
}

/// Entries of `old` whose device is gone from `new`
pub fn removed(old: &[Entry], new: &[Entry]) -> Vec<Entry> {
    added(new, old)
}

/// Entries present in both whose content changed, as they are in `new`
pub fn updated(old: &[Entry], new: &[Entry]) -> Vec<Entry> {
    new.iter()
        .filter(|n| {
            old.iter()
                .any(|o| o.device_file == n.device_file && o != *n)
        })
        .cloned()
        .collect()
}

/// All changes from one snapshot to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotDiff {
    pub added: Vec<Entry>,
    pub removed: Vec<Entry>,
    pub updated: Vec<Entry>,
}

impl SnapshotDiff {
    pub fn between(old: &[Entry], new: &[Entry]) -> Self {
        Self {
            added: added(old, new),
            removed: removed(old, new),
            updated: updated(old, new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}
