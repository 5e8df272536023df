//! In-memory host filesystem
//!
//! `MemoryFs` implements both [`FilesystemPort`] and [`SymlinkResolver`]
//! over a map of absolute paths, so the whole scanner can run against a
//! fabricated `/proc` and `/dev` without touching the real machine.
//! Available to other crates with the `test-support` feature.
//!
//! ```rust
//! use serial_usage::memfs::MemoryFs;
//! use serial_usage::{Host, HostLayout, PortProber};
//!
//! let fs = MemoryFs::new()
//!     .file("/proc/tty/drivers", "usbserial /dev/ttyUSB 188 0-511 serial\n")
//!     .file("/dev/ttyUSB0", "")
//!     .process(100, &["/dev/ttyUSB0"]);
//!
//! let prober = PortProber::new(Host::with_filesystem(HostLayout::default(), fs));
//! let snapshot = prober.probe(false).unwrap();
//! assert_eq!(snapshot[0].used_by_pids, vec![100]);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use crate::host::{DirEntry, FilesystemPort, SymlinkResolver};
use crate::Pid;

const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(String),
    Dir,
    Symlink(String),
    /// Directory that exists but cannot be read
    Denied,
}

/// Map-backed filesystem with symlinks and permission failures
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: BTreeMap<String, Node>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self { nodes }
    }

    /// Regular file with the given contents
    pub fn file(self, path: &str, contents: &str) -> Self {
        self.insert(path, Node::File(contents.to_string()))
    }

    pub fn dir(self, path: &str) -> Self {
        self.insert(path, Node::Dir)
    }

    /// Symlink whose target may be absolute or relative to the link's directory
    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.insert(path, Node::Symlink(target.to_string()))
    }

    /// Directory that refuses to be listed or traversed
    pub fn denied(self, path: &str) -> Self {
        self.insert(path, Node::Denied)
    }

    /// Live process under `/proc` whose descriptors point at `targets`
    pub fn process(self, pid: Pid, targets: &[&str]) -> Self {
        let fd_dir = format!("/proc/{pid}/fd");
        let mut fs = self.dir(&fd_dir);
        for (fd, target) in targets.iter().enumerate() {
            fs = fs.symlink(&format!("{fd_dir}/{fd}"), target);
        }
        fs
    }

    /// Process whose descriptor directory is unreadable
    pub fn hidden_process(self, pid: Pid) -> Self {
        self.denied(&format!("/proc/{pid}/fd"))
    }

    fn insert(mut self, path: &str, node: Node) -> Self {
        let parts = components(Path::new(path));
        for depth in 1..parts.len() {
            self.nodes
                .entry(render(&parts[..depth]))
                .or_insert(Node::Dir);
        }
        self.nodes.insert(render(&parts), node);
        self
    }

    /// Walk `path` following symlinks and return the final absolute path
    fn resolve(&self, path: &Path) -> io::Result<String> {
        let mut pending: VecDeque<String> = components(path).into();
        let mut current: Vec<String> = Vec::new();
        let mut hops = 0;

        while let Some(part) = pending.pop_front() {
            match part.as_str() {
                "." => continue,
                ".." => {
                    current.pop();
                    continue;
                }
                _ => current.push(part),
            }

            let here = render(&current);
            match self.nodes.get(&here) {
                None => return Err(not_found(&here)),
                Some(Node::Symlink(target)) => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return Err(io::Error::new(
                            io::ErrorKind::Other,
                            format!("too many levels of symbolic links: {here}"),
                        ));
                    }
                    current.pop();
                    if target.starts_with('/') {
                        current.clear();
                    }
                    for part in components(Path::new(target)).into_iter().rev() {
                        pending.push_front(part);
                    }
                }
                Some(Node::Denied) if !pending.is_empty() => return Err(denied(&here)),
                Some(_) => {}
            }
        }

        Ok(render(&current))
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemPort for MemoryFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let dir = self.resolve(path)?;
        match self.nodes.get(&dir) {
            Some(Node::Dir) => {}
            Some(Node::Denied) => return Err(denied(&dir)),
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("not a directory: {dir}"),
                ))
            }
            None => return Err(not_found(&dir)),
        }

        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        let entries = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, node)| {
                let name = &key[prefix.len()..];
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(DirEntry {
                    name: name.to_string(),
                    is_dir: matches!(node, Node::Dir | Node::Denied),
                })
            })
            .collect();
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let file = self.resolve(path)?;
        match self.nodes.get(&file) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Denied) => Err(denied(&file)),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {file}"),
            )),
            None => Err(not_found(&file)),
        }
    }
}

impl SymlinkResolver for MemoryFs {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.resolve(path).map(PathBuf::from)
    }
}

fn components(path: &Path) -> Vec<String> {
    path.to_string_lossy()
        .split('/')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn render(parts: &[String]) -> String {
    format!("/{}", parts.join("/"))
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}"))
}

fn denied(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {path}"),
    )
}
