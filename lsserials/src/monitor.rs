//! Polling monitor
//!
//! Each tick is an independent probe; the previous snapshot is only kept
//! to diff against. A failed probe ends the monitor.

use std::io::Write;
use std::thread;
use std::time::Duration;

use serial_usage::{PortProber, Snapshot, SnapshotDiff, UsageError};
use tracing::debug;

use crate::report;

pub struct Monitor<'a> {
    prober: &'a PortProber,
    check_serial_by: bool,
    current: Snapshot,
}

impl<'a> Monitor<'a> {
    pub fn new(prober: &'a PortProber, check_serial_by: bool, initial: Snapshot) -> Self {
        Self {
            prober,
            check_serial_by,
            current: initial,
        }
    }

    /// Probe once and return what changed since the last probe
    pub fn poll(&mut self) -> Result<SnapshotDiff, UsageError> {
        let next = self.prober.probe(self.check_serial_by)?;
        let diff = SnapshotDiff::between(&self.current, &next);
        self.current = next;
        Ok(diff)
    }

    /// Poll forever, printing changes; returns only on failure
    pub fn run(&mut self, interval: Duration, out: &mut impl Write, json: bool) -> anyhow::Result<()> {
        loop {
            thread::sleep(interval);
            let diff = self.poll()?;
            if !diff.is_empty() {
                debug!(
                    "{} added, {} removed, {} updated",
                    diff.added.len(),
                    diff.removed.len(),
                    diff.updated.len()
                );
            }
            report::print_diff(out, &diff, json)?;
        }
    }
}
