//! Process descriptor index
//!
//! Reads the process information filesystem: one numeric directory per
//! live PID, each with an `fd` directory of descriptor symlinks.

use tracing::{debug, trace};

use crate::entry::Pid;
use crate::error::UsageError;
use crate::host::Host;
use crate::scanner::DirScanner;

/// Descriptor targets of every live process at one moment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenFiles {
    /// Processes whose descriptor table was read, ascending by PID
    pub scanned: Vec<(Pid, Vec<String>)>,
    /// Processes whose descriptor table could not be read
    pub unreadable: Vec<Pid>,
}

impl OpenFiles {
    /// True when every live process was scanned
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty()
    }

    /// Processes with a descriptor resolving exactly to `target`
    pub fn users_of(&self, target: &str) -> Vec<Pid> {
        self.scanned
            .iter()
            .filter(|(_, files)| files.iter().any(|f| f == target))
            .map(|(pid, _)| *pid)
            .collect()
    }
}

/// Lists processes and their open files
pub struct ProcessFdIndex<'a> {
    host: &'a Host,
}

impl<'a> ProcessFdIndex<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self { host }
    }

    /// PIDs of all live processes, ascending
    ///
    /// Fails only when the process root itself cannot be listed.
    pub fn list_processes(&self) -> Result<Vec<Pid>, UsageError> {
        let root = &self.host.layout().proc_root;
        let listing = DirScanner::read(self.host.fs(), root).map_err(|e| match e {
            UsageError::ListFailed { path, source } => {
                UsageError::ProcessRootUnavailable { path, source }
            }
            other => other,
        })?;

        let mut pids: Vec<Pid> = listing
            .numeric_names()
            .into_iter()
            .filter_map(|n| Pid::try_from(n).ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Canonical targets of every descriptor `pid` holds
    ///
    /// Descriptors that do not resolve (sockets, pipes, deleted files) are
    /// kept as their `/proc/<pid>/fd/<n>` path. An unreadable `fd`
    /// directory is reported as [`UsageError::DescriptorsUnavailable`];
    /// that is the usual outcome for other users' processes or for a
    /// process that exited after it was listed.
    pub fn list_open_files_by_pid(&self, pid: Pid) -> Result<Vec<String>, UsageError> {
        let fd_dir = self.host.layout().fd_dir(pid);
        let listing = self
            .host
            .fs()
            .list_dir(&fd_dir)
            .map(DirScanner::from_entries)
            .map_err(|source| UsageError::DescriptorsUnavailable { pid, source })?;

        Ok(listing.resolved_names(&fd_dir, self.host.resolver(), false))
    }

    /// Read every live process's descriptor table once
    pub fn scan(&self) -> Result<OpenFiles, UsageError> {
        let mut open = OpenFiles::default();
        for pid in self.list_processes()? {
            match self.list_open_files_by_pid(pid) {
                Ok(files) => open.scanned.push((pid, files)),
                Err(e) => {
                    trace!("{}", e);
                    open.unreadable.push(pid);
                }
            }
        }
        debug!(
            "Scanned descriptors of {} process(es), {} unreadable",
            open.scanned.len(),
            open.unreadable.len()
        );
        Ok(open)
    }
}
