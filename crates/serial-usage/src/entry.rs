//! Snapshot entries

use std::ops::Deref;

use crate::sort::sort_entries;
use crate::usage::Usage;

/// Process ID as found under the process root
pub type Pid = u32;

/// Single-value marker for a port that is free
pub const NOT_IN_USE_PID: i64 = -1;

/// Single-value marker for a port whose usage could not be determined
/// (missing rights, non-root user)
pub const UNCERTAIN_PID: i64 = -2;

/// Observed state of one serial port
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// Canonical device path, unique within a snapshot
    pub device_file: String,
    /// Processes holding the device open, ascending
    pub used_by_pids: Vec<Pid>,
    /// False when some descriptor table could not be read, so
    /// `used_by_pids` may be an undercount
    pub certain: bool,
    /// Link under `/dev/serial/by-id` pointing here
    pub device_by_id: Option<String>,
    /// Link under `/dev/serial/by-path` pointing here
    pub device_by_path: Option<String>,
}

impl Entry {
    pub fn new(device_file: impl Into<String>, usage: Usage) -> Self {
        Self {
            device_file: device_file.into(),
            used_by_pids: usage.pids,
            certain: usage.certain,
            device_by_id: None,
            device_by_path: None,
        }
    }

    /// Usage part of the entry
    pub fn usage(&self) -> Usage {
        Usage {
            pids: self.used_by_pids.clone(),
            certain: self.certain,
        }
    }

    pub fn is_free(&self) -> bool {
        self.used_by_pids.is_empty()
    }

    /// See [`Usage::pid_marker`]
    pub fn pid_marker(&self) -> i64 {
        self.usage().pid_marker()
    }

    /// Whether `name` is this device or one of its stable links
    pub fn has_any(&self, name: &str) -> bool {
        self.device_file == name
            || self.device_by_id.as_deref() == Some(name)
            || self.device_by_path.as_deref() == Some(name)
    }
}

/// Sorted, point-in-time list of entries
///
/// A snapshot is never modified after a probe returns it, so keeping an
/// old one around for diffing is safe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Snapshot {
    entries: Vec<Entry>,
}

impl Snapshot {
    /// Build a snapshot, sorting by device name
    pub fn new(mut entries: Vec<Entry>) -> Self {
        sort_entries(&mut entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry for a device file or one of its by-id/by-path links
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.has_any(name))
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl Deref for Snapshot {
    type Target = [Entry];

    fn deref(&self) -> &[Entry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dev: &str, pids: Vec<Pid>) -> Entry {
        Entry::new(dev, Usage { pids, certain: true })
    }

    #[test]
    fn test_has_any_matches_links() {
        let mut e = entry("/dev/ttyUSB1", vec![]);
        e.device_by_id = Some("/dev/serial/by-id/usb-1a86_USB2.0-Serial-if00-port0".into());
        assert!(e.has_any("/dev/ttyUSB1"));
        assert!(e.has_any("/dev/serial/by-id/usb-1a86_USB2.0-Serial-if00-port0"));
        assert!(!e.has_any("/dev/serial/by-path/x"));
        assert!(!e.has_any(""));
    }

    #[test]
    fn test_pid_marker() {
        assert_eq!(entry("/dev/ttyS0", vec![]).pid_marker(), NOT_IN_USE_PID);
        assert_eq!(entry("/dev/ttyS0", vec![31, 40]).pid_marker(), 31);

        let uncertain = Entry::new(
            "/dev/ttyS0",
            Usage {
                pids: vec![],
                certain: false,
            },
        );
        assert_eq!(uncertain.pid_marker(), UNCERTAIN_PID);
    }

    #[test]
    fn test_snapshot_sorts_and_finds() {
        let mut linked = entry("/dev/ttyUSB0", vec![]);
        linked.device_by_path = Some("/dev/serial/by-path/pci-0".into());
        let snap = Snapshot::new(vec![
            entry("/dev/ttyUSB10", vec![]),
            linked,
            entry("/dev/ttyUSB2", vec![]),
        ]);
        let devs: Vec<_> = snap.iter().map(|e| e.device_file.as_str()).collect();
        assert_eq!(devs, vec!["/dev/ttyUSB0", "/dev/ttyUSB2", "/dev/ttyUSB10"]);
        assert_eq!(
            snap.find("/dev/serial/by-path/pci-0").map(|e| e.device_file.as_str()),
            Some("/dev/ttyUSB0")
        );
        assert!(snap.find("/dev/ttyACM0").is_none());
    }
}
