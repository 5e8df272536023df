//! Error types for serial usage detection

use std::io;

use thiserror::Error;

use crate::entry::Pid;

/// Errors that can occur while scanning the host
#[derive(Debug, Error)]
pub enum UsageError {
    /// A directory could not be listed
    #[error("failed to list {path}: {source}")]
    ListFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A file could not be read
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The process information filesystem is missing or unreadable
    #[error("cannot read process root {path}: {source}")]
    ProcessRootUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Descriptor table of a single process could not be listed
    #[error("cannot list descriptors of pid {pid}: {source}")]
    DescriptorsUnavailable {
        pid: Pid,
        #[source]
        source: io::Error,
    },

    /// File asked about does not exist
    #[error("file {0} does not exist")]
    NotFound(String),
}

impl UsageError {
    /// True for failures that only downgrade certainty instead of aborting a probe
    pub fn is_soft(&self) -> bool {
        matches!(self, UsageError::DescriptorsUnavailable { .. })
    }
}
