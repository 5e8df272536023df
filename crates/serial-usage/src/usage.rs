//! Device usage resolution
//!
//! Answers "who holds this device open" by comparing the canonical device
//! path against the canonical descriptor targets of every live process.
//! The answer is best effort: processes whose descriptor table cannot be
//! read make the result uncertain, but never discard matches found in the
//! other processes.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::entry::{Pid, NOT_IN_USE_PID, UNCERTAIN_PID};
use crate::error::UsageError;
use crate::host::Host;
use crate::process::{OpenFiles, ProcessFdIndex};

/// Processes holding a file open, and whether that list is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    /// Matching PIDs among the processes that could be scanned, ascending
    pub pids: Vec<Pid>,
    /// False when at least one process could not be scanned
    pub certain: bool,
}

impl Usage {
    pub fn is_free(&self) -> bool {
        self.pids.is_empty()
    }

    /// Collapse into one PID-like value: the first user, or
    /// [`UNCERTAIN_PID`] / [`NOT_IN_USE_PID`] when nobody was found
    pub fn pid_marker(&self) -> i64 {
        match self.pids.first() {
            Some(pid) => i64::from(*pid),
            None if !self.certain => UNCERTAIN_PID,
            None => NOT_IN_USE_PID,
        }
    }
}

/// Resolves device usage against the process table
pub struct UsageResolver<'a> {
    host: &'a Host,
}

impl<'a> UsageResolver<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self { host }
    }

    /// Canonical form of `filename`, or `filename` itself if it does not resolve
    pub fn canonical_name(&self, filename: &str) -> String {
        self.host
            .canonicalize(Path::new(filename))
            .unwrap_or_else(|e| {
                debug!("Using {} unresolved: {}", filename, e);
                filename.to_string()
            })
    }

    /// Usage of `filename` against an already collected descriptor scan
    pub fn usage_in(&self, open: &OpenFiles, filename: &str) -> Usage {
        let target = self.canonical_name(filename);
        Usage {
            pids: open.users_of(&target),
            certain: open.is_complete(),
        }
    }

    /// Scan every live process and report which of them hold `filename` open
    ///
    /// Fails only when the process root cannot be listed.
    pub fn file_is_in_use_by_pids(&self, filename: &str) -> Result<Usage, UsageError> {
        let open = ProcessFdIndex::new(self.host).scan()?;
        Ok(self.usage_in(&open, filename))
    }

    /// Direct check of one file, which must exist
    pub fn file_is_in_use(&self, filename: &str) -> Result<Usage, UsageError> {
        if let Err(e) = self.host.resolver().canonicalize(Path::new(filename)) {
            if e.kind() == io::ErrorKind::NotFound {
                return Err(UsageError::NotFound(filename.to_string()));
            }
        }
        self.file_is_in_use_by_pids(filename)
    }
}
