//! Serial Port Usage Library
//!
//! This crate finds the serial device files on a Linux host and reports
//! which processes currently hold each of them open, by cross-referencing
//! the device paths with every process's descriptor table under `/proc`.
//!
//! The result is advisory: ports are never locked, and when some
//! descriptor tables cannot be read (other users' processes, races with
//! exiting processes) entries are marked uncertain rather than failing.
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_usage::{PortProber, SnapshotDiff};
//!
//! let prober = PortProber::system();
//! let before = prober.probe(true).unwrap();
//!
//! for entry in &before {
//!     println!("{} used by {:?}", entry.device_file, entry.used_by_pids);
//! }
//!
//! let after = prober.probe(true).unwrap();
//! let diff = SnapshotDiff::between(&before, &after);
//! println!("{} added, {} removed", diff.added.len(), diff.removed.len());
//! ```

pub mod devices;
pub mod diff;
pub mod entry;
pub mod error;
pub mod host;
#[cfg(any(test, feature = "test-support"))]
pub mod memfs;
pub mod probe;
pub mod process;
pub mod scanner;
pub mod sort;
pub mod usage;

pub use devices::{parse_tty_drivers, DeviceEnumerator, LinkMap};
pub use diff::{added, removed, updated, SnapshotDiff};
pub use entry::{Entry, Pid, Snapshot, NOT_IN_USE_PID, UNCERTAIN_PID};
pub use error::UsageError;
pub use host::{DirEntry, FilesystemPort, Host, HostLayout, StdFilesystem, SymlinkResolver};
pub use probe::PortProber;
pub use process::{OpenFiles, ProcessFdIndex};
pub use scanner::DirScanner;
pub use sort::{compare_device_names, sort_entries};
pub use usage::{Usage, UsageResolver};
