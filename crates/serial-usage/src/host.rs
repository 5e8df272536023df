//! Host filesystem capabilities
//!
//! The scanner never touches `std::fs` directly. Directory listing and
//! symlink resolution go through two small traits so that tests (and
//! callers with unusual layouts) can swap in their own implementation.
//! Both are fixed when a [`Host`] is built and never change afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name without any leading path
    pub name: String,
    /// True when the entry itself is a directory (symlinks are not followed)
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Directory listing and plain file reads
pub trait FilesystemPort: Send + Sync {
    /// List the entries of a directory, ordered by name
    ///
    /// A listing cut short by a read error must fail as a whole, never
    /// come back as a partial `Ok`.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a whole text file
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Symlink canonicalization strategy
pub trait SymlinkResolver: Send + Sync {
    /// Follow every symlink in `path` and return the absolute, normalized target
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real filesystem, through `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl FilesystemPort for StdFilesystem {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        collect_listing(fs::read_dir(path)?.map(|entry| {
            let entry = entry?;
            // A file removed after readdir still has a name; treat it as a file
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            Ok(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            })
        }))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

impl SymlinkResolver for StdFilesystem {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

/// Sorted listing, or the first read error
fn collect_listing(
    entries: impl Iterator<Item = io::Result<DirEntry>>,
) -> io::Result<Vec<DirEntry>> {
    let mut entries = entries.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Where the host keeps the files the scanner reads
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HostLayout {
    /// Process information root, one numeric directory per live PID
    pub proc_root: PathBuf,
    /// TTY driver table (`/proc/tty/drivers` format)
    pub tty_drivers: PathBuf,
    /// Device root holding the device files directly
    pub dev_root: PathBuf,
    /// Parent of the `by-id` and `by-path` symlink farms
    pub serial_root: PathBuf,
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            tty_drivers: PathBuf::from("/proc/tty/drivers"),
            dev_root: PathBuf::from("/dev"),
            serial_root: PathBuf::from("/dev/serial"),
        }
    }
}

impl HostLayout {
    /// Layout with every root placed under `root` (for chroots and test trees)
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            proc_root: root.join("proc"),
            tty_drivers: root.join("proc/tty/drivers"),
            dev_root: root.join("dev"),
            serial_root: root.join("dev/serial"),
        }
    }

    pub fn by_id_dir(&self) -> PathBuf {
        self.serial_root.join("by-id")
    }

    pub fn by_path_dir(&self) -> PathBuf {
        self.serial_root.join("by-path")
    }

    pub fn fd_dir(&self, pid: crate::Pid) -> PathBuf {
        self.proc_root.join(pid.to_string()).join("fd")
    }
}

/// Capabilities plus layout, shared by every scanner component
#[derive(Clone)]
pub struct Host {
    layout: HostLayout,
    fs: Arc<dyn FilesystemPort>,
    resolver: Arc<dyn SymlinkResolver>,
}

impl Host {
    /// The running system with the standard Linux layout
    pub fn system() -> Self {
        Self::with_filesystem(HostLayout::default(), StdFilesystem)
    }

    /// Build from separate listing and resolution strategies
    pub fn new(
        layout: HostLayout,
        fs: Arc<dyn FilesystemPort>,
        resolver: Arc<dyn SymlinkResolver>,
    ) -> Self {
        Self {
            layout,
            fs,
            resolver,
        }
    }

    /// Build from one value that provides both capabilities
    pub fn with_filesystem<F>(layout: HostLayout, fs: F) -> Self
    where
        F: FilesystemPort + SymlinkResolver + 'static,
    {
        let fs = Arc::new(fs);
        Self {
            layout,
            fs: fs.clone(),
            resolver: fs,
        }
    }

    pub fn layout(&self) -> &HostLayout {
        &self.layout
    }

    pub fn fs(&self) -> &dyn FilesystemPort {
        self.fs.as_ref()
    }

    pub fn resolver(&self) -> &dyn SymlinkResolver {
        self.resolver.as_ref()
    }

    /// Canonicalize into a display string
    pub fn canonicalize(&self, path: &Path) -> io::Result<String> {
        self.resolver
            .canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Join a name onto a base path and render it as a string
pub(crate) fn join(base: &Path, name: &str) -> String {
    base.join(name).to_string_lossy().into_owned()
}
