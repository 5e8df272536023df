//! Typed views over a single directory listing

use std::path::Path;

use tracing::trace;

use crate::error::UsageError;
use crate::host::{join, DirEntry, FilesystemPort, SymlinkResolver};

/// One directory listing and the ways the scanner slices it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirScanner {
    entries: Vec<DirEntry>,
}

impl DirScanner {
    /// List `path`; a listing failure is returned to the caller
    pub fn read(fs: &dyn FilesystemPort, path: &Path) -> Result<Self, UsageError> {
        fs.list_dir(path)
            .map(Self::from_entries)
            .map_err(|source| UsageError::ListFailed {
                path: path.display().to_string(),
                source,
            })
    }

    pub fn from_entries(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Values of entries whose whole name is a non-negative decimal integer
    pub fn numeric_names(&self) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|e| !e.name.is_empty() && e.name.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|e| e.name.parse().ok())
            .collect()
    }

    /// Names of non-directory entries, joined onto `prefix` when given
    pub fn files_only(&self, prefix: Option<&Path>) -> Vec<String> {
        self.names_where(prefix, |e| !e.is_dir)
    }

    /// Names of directory entries, joined onto `prefix` when given
    pub fn dirs_only(&self, prefix: Option<&Path>) -> Vec<String> {
        self.names_where(prefix, |e| e.is_dir)
    }

    fn names_where(&self, prefix: Option<&Path>, keep: impl Fn(&DirEntry) -> bool) -> Vec<String> {
        self.entries
            .iter()
            .filter(|&e| keep(e))
            .map(|e| match prefix {
                Some(prefix) => join(prefix, &e.name),
                None => e.name.clone(),
            })
            .collect()
    }

    /// Canonical path of `base/name` for every entry
    ///
    /// An entry that does not resolve is dropped when `skip_unresolved` is
    /// set, and kept as the unresolved joined path otherwise, so the result
    /// then has exactly one element per entry.
    pub fn resolved_names(
        &self,
        base: &Path,
        resolver: &dyn SymlinkResolver,
        skip_unresolved: bool,
    ) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| {
                let joined = base.join(&e.name);
                match resolver.canonicalize(&joined) {
                    Ok(target) => Some(target.to_string_lossy().into_owned()),
                    Err(err) => {
                        trace!("Unresolved {}: {}", joined.display(), err);
                        (!skip_unresolved).then(|| joined.to_string_lossy().into_owned())
                    }
                }
            })
            .collect()
    }
}
