//! Serial device enumeration
//!
//! Candidates come from two places:
//! - device files directly under the device root whose names start with a
//!   prefix the tty driver table marks as `serial`
//! - the `by-id` / `by-path` symlink farms, where udev provides them

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::UsageError;
use crate::host::{join, Host};
use crate::scanner::DirScanner;

/// Canonical device path to the symlink that points at it
pub type LinkMap = BTreeMap<String, String>;

/// Relative escape a farm symlink uses to reach the device root
const FARM_ESCAPE: &str = "../../";

/// Device-name prefixes of the `serial` rows of a tty driver table
///
/// Each row is whitespace delimited; rows with exactly five fields whose
/// last field is `serial` contribute their second field.
pub fn parse_tty_drivers(table: &str) -> Vec<String> {
    table
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [_, prefix, _, _, "serial"] => Some(prefix.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Finds candidate serial device files
pub struct DeviceEnumerator<'a> {
    host: &'a Host,
}

impl<'a> DeviceEnumerator<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self { host }
    }

    /// Serial device-name prefixes, empty when the driver table is unreadable
    pub fn serial_driver_prefixes(&self) -> Vec<String> {
        let path = &self.host.layout().tty_drivers;
        match self.host.fs().read_to_string(path) {
            Ok(table) => parse_tty_drivers(&table),
            Err(e) => {
                debug!("No tty driver table at {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Non-directory device files matching a serial driver prefix
    ///
    /// Each candidate is reported by its canonical path, the same key the
    /// link farms produce; one that does not resolve keeps the joined path.
    pub fn list_by_dev(&self) -> Result<Vec<String>, UsageError> {
        let prefixes: Vec<String> = self
            .serial_driver_prefixes()
            .iter()
            .map(|p| self.name_prefix(p).to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if prefixes.is_empty() {
            return Ok(Vec::new());
        }

        let dev_root = &self.host.layout().dev_root;
        let listing = DirScanner::read(self.host.fs(), dev_root)?;
        Ok(listing
            .files_only(None)
            .into_iter()
            .filter(|name| prefixes.iter().any(|p| name.starts_with(p.as_str())))
            .map(|name| {
                let joined = join(dev_root, &name);
                match self.host.canonicalize(Path::new(&joined)) {
                    Ok(canonical) => canonical,
                    Err(e) => {
                        trace!("Keeping unresolved {}: {}", joined, e);
                        joined
                    }
                }
            })
            .collect())
    }

    /// Devices reachable through `/dev/serial/by-id`
    pub fn list_by_id(&self) -> Result<LinkMap, UsageError> {
        self.list_farm(&self.host.layout().by_id_dir())
    }

    /// Devices reachable through `/dev/serial/by-path`
    pub fn list_by_path(&self) -> Result<LinkMap, UsageError> {
        self.list_farm(&self.host.layout().by_path_dir())
    }

    fn list_farm(&self, farm: &Path) -> Result<LinkMap, UsageError> {
        let listing = DirScanner::read(self.host.fs(), farm)?;

        let mut links = LinkMap::new();
        for link in listing.files_only(Some(farm)) {
            match self.host.canonicalize(Path::new(&link)) {
                Ok(target) => {
                    links.insert(self.rebase(&target), link);
                }
                Err(e) => trace!("Skipping {}: {}", link, e),
            }
        }
        Ok(links)
    }

    /// Driver tables name prefixes as `/dev/ttyS`; match on the file name part
    fn name_prefix<'p>(&self, prefix: &'p str) -> &'p str {
        prefix
            .strip_prefix("/dev/")
            .or_else(|| {
                let root = self.host.layout().dev_root.to_str()?;
                prefix.strip_prefix(root)?.strip_prefix('/')
            })
            .unwrap_or(prefix)
    }

    /// Rewrite a leading `../../` so link targets compare with device paths
    fn rebase(&self, target: &str) -> String {
        match target.strip_prefix(FARM_ESCAPE) {
            Some(rest) => join(&self.host.layout().dev_root, rest),
            None => target.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FilesystemPort, HostLayout, StdFilesystem, SymlinkResolver};
    use crate::memfs::MemoryFs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Arc;

    const DRIVERS: &str = "\
/dev/tty             /dev/tty        5       0 system:/dev/tty
/dev/console         /dev/console    5       1 system:console
/dev/ptmx            /dev/ptmx       5       2 system
rfcomm               /dev/rfcomm   216 0-255 serial
usbserial            /dev/ttyUSB   188 0-511 serial
acm                  /dev/ttyACM   166 0-255 serial
serial               /dev/ttyS       4 64-111 serial
pty_slave            /dev/pts      136 0-1048575 pty:slave
broken row serial
";

    fn host(fs: MemoryFs) -> Host {
        Host::with_filesystem(HostLayout::default(), fs)
    }

    #[test]
    fn test_parse_tty_drivers() {
        assert_eq!(
            parse_tty_drivers(DRIVERS),
            vec!["/dev/rfcomm", "/dev/ttyUSB", "/dev/ttyACM", "/dev/ttyS"]
        );
        assert!(parse_tty_drivers("").is_empty());
    }

    #[test]
    fn test_list_by_dev() {
        let host = host(
            MemoryFs::new()
                .file("/proc/tty/drivers", DRIVERS)
                .file("/dev/ttyS0", "")
                .file("/dev/ttyS1", "")
                .file("/dev/ttyUSB0", "")
                .file("/dev/tty0", "")
                .file("/dev/null", "")
                .dir("/dev/ttyS_dir"),
        );
        let devs = DeviceEnumerator::new(&host).list_by_dev().unwrap();
        assert_eq!(devs, vec!["/dev/ttyS0", "/dev/ttyS1", "/dev/ttyUSB0"]);
    }

    #[test]
    fn test_missing_driver_table_lists_nothing() {
        let host = host(MemoryFs::new().file("/dev/ttyS0", ""));
        let enumerator = DeviceEnumerator::new(&host);
        assert!(enumerator.serial_driver_prefixes().is_empty());
        assert!(enumerator.list_by_dev().unwrap().is_empty());
    }

    #[test]
    fn test_custom_dev_root() {
        let layout = HostLayout {
            dev_root: PathBuf::from("/chroot/dev"),
            ..HostLayout::default()
        };
        let fs = MemoryFs::new()
            .file("/proc/tty/drivers", DRIVERS)
            .file("/chroot/dev/ttyACM2", "");
        let host = Host::with_filesystem(layout, fs);
        let devs = DeviceEnumerator::new(&host).list_by_dev().unwrap();
        assert_eq!(devs, vec!["/chroot/dev/ttyACM2"]);
    }

    #[test]
    fn test_dev_root_behind_symlink_lists_canonical_paths() {
        let layout = HostLayout {
            dev_root: PathBuf::from("/chroot/dev"),
            serial_root: PathBuf::from("/chroot/dev/serial"),
            ..HostLayout::default()
        };
        let fs = MemoryFs::new()
            .file("/proc/tty/drivers", DRIVERS)
            .symlink("/chroot", "/real")
            .file("/real/dev/ttyUSB0", "")
            .symlink("/real/dev/serial/by-id/usb-x", "../../ttyUSB0");
        let host = Host::with_filesystem(layout, fs);
        let enumerator = DeviceEnumerator::new(&host);

        let devs = enumerator.list_by_dev().unwrap();
        assert_eq!(devs, vec!["/real/dev/ttyUSB0"]);
        let by_id = enumerator.list_by_id().unwrap();
        assert_eq!(by_id.keys().collect::<Vec<_>>(), vec![&devs[0]]);
    }

    #[test]
    fn test_list_by_id_and_path() {
        let host = host(
            MemoryFs::new()
                .file("/dev/ttyUSB1", "")
                .symlink(
                    "/dev/serial/by-id/usb-1a86_USB2.0-Serial-if00-port0",
                    "../../ttyUSB1",
                )
                .symlink("/dev/serial/by-id/usb-dangling", "../../ttyUSB7")
                .symlink(
                    "/dev/serial/by-path/pci-0000:05:00.3-usb-0:2:1.0-port0",
                    "../../ttyUSB1",
                ),
        );
        let enumerator = DeviceEnumerator::new(&host);

        let by_id = enumerator.list_by_id().unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(
            by_id["/dev/ttyUSB1"],
            "/dev/serial/by-id/usb-1a86_USB2.0-Serial-if00-port0"
        );

        let by_path = enumerator.list_by_path().unwrap();
        assert_eq!(
            by_path["/dev/ttyUSB1"],
            "/dev/serial/by-path/pci-0000:05:00.3-usb-0:2:1.0-port0"
        );
    }

    #[test]
    fn test_missing_farm_is_error() {
        let host = host(MemoryFs::new().dir("/dev"));
        assert!(DeviceEnumerator::new(&host).list_by_id().is_err());
    }

    /// Resolver that returns raw relative link text, as `readlink` would
    struct Readlink;

    impl SymlinkResolver for Readlink {
        fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
            if path.starts_with("/dev/serial") {
                Ok(PathBuf::from("../../ttyACM0"))
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "no link"))
            }
        }
    }

    #[test]
    fn test_relative_targets_are_rebased() {
        let fs: Arc<dyn FilesystemPort> =
            Arc::new(MemoryFs::new().file("/dev/serial/by-id/usb-modem", ""));
        let host = Host::new(HostLayout::default(), fs, Arc::new(Readlink));
        let by_id = DeviceEnumerator::new(&host).list_by_id().unwrap();
        assert_eq!(by_id["/dev/ttyACM0"], "/dev/serial/by-id/usb-modem");
    }

    #[test]
    fn test_real_tree() {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir().unwrap();
        let root_path = std::fs::canonicalize(root.path()).unwrap();
        let layout = HostLayout::rooted_at(&root_path);
        std::fs::create_dir_all(layout.tty_drivers.parent().unwrap()).unwrap();
        std::fs::write(&layout.tty_drivers, DRIVERS).unwrap();
        std::fs::create_dir_all(layout.by_id_dir()).unwrap();
        std::fs::write(layout.dev_root.join("ttyUSB3"), "").unwrap();
        symlink("../../ttyUSB3", layout.by_id_dir().join("usb-ftdi")).unwrap();

        let host = Host::with_filesystem(layout.clone(), StdFilesystem);
        let enumerator = DeviceEnumerator::new(&host);

        let device = join(&layout.dev_root, "ttyUSB3");
        assert_eq!(enumerator.list_by_dev().unwrap(), vec![device.clone()]);
        let by_id = enumerator.list_by_id().unwrap();
        assert_eq!(by_id[&device], join(&layout.by_id_dir(), "usb-ftdi"));
    }
}
