//! Point-in-time probe of every serial port on the host
//!
//! A probe reads the process table once, resolves usage for each
//! candidate device, optionally attaches the stable by-id / by-path link
//! names, and returns a sorted [`Snapshot`]. Nothing is cached between
//! calls, so a poller can call [`PortProber::probe`] on a timer and diff
//! consecutive results.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::devices::{DeviceEnumerator, LinkMap};
use crate::entry::{Entry, Snapshot};
use crate::error::UsageError;
use crate::host::Host;
use crate::process::{OpenFiles, ProcessFdIndex};
use crate::usage::{Usage, UsageResolver};

/// Serial port prober
#[derive(Debug, Clone)]
pub struct PortProber {
    host: Host,
}

impl PortProber {
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// Prober for the running system
    pub fn system() -> Self {
        Self::new(Host::system())
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Direct usage check of a single file, see [`UsageResolver::file_is_in_use`]
    pub fn file_is_in_use(&self, filename: &str) -> Result<Usage, UsageError> {
        UsageResolver::new(&self.host).file_is_in_use(filename)
    }

    /// Take a snapshot of all serial ports
    ///
    /// Fails when the process root or the device root cannot be listed.
    /// With `check_serial_by`, entries also get their by-id / by-path
    /// links; if either farm is missing the base snapshot is returned
    /// unchanged.
    pub fn probe(&self, check_serial_by: bool) -> Result<Snapshot, UsageError> {
        let open = ProcessFdIndex::new(&self.host).scan()?;
        let enumerator = DeviceEnumerator::new(&self.host);
        let resolver = UsageResolver::new(&self.host);

        let mut entries: BTreeMap<String, Entry> = BTreeMap::new();
        for device in enumerator.list_by_dev()? {
            if !entries.contains_key(&device) {
                let usage = resolver.usage_in(&open, &device);
                entries.insert(device.clone(), Entry::new(device, usage));
            }
        }

        if check_serial_by {
            match (enumerator.list_by_id(), enumerator.list_by_path()) {
                (Ok(by_id), Ok(by_path)) => {
                    self.attach_links(&mut entries, &open, &by_id, &by_path);
                }
                (Err(e), _) | (_, Err(e)) => debug!("Skipping serial links: {}", e),
            }
        }

        let snapshot = Snapshot::new(entries.into_values().collect());
        info!(
            "Probed {} serial port(s), {} in use",
            snapshot.len(),
            snapshot.iter().filter(|e| !e.is_free()).count()
        );
        Ok(snapshot)
    }

    fn attach_links(
        &self,
        entries: &mut BTreeMap<String, Entry>,
        open: &OpenFiles,
        by_id: &LinkMap,
        by_path: &LinkMap,
    ) {
        let resolver = UsageResolver::new(&self.host);
        for device in by_id.keys().chain(by_path.keys()) {
            let entry = entries
                .entry(device.clone())
                .or_insert_with(|| Entry::new(device.clone(), resolver.usage_in(open, device)));
            entry.device_by_id = by_id.get(device).cloned();
            entry.device_by_path = by_path.get(device).cloned();
        }
    }
}

impl Default for PortProber {
    fn default() -> Self {
        Self::system()
    }
}
