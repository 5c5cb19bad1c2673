//! Filesystem access used by the walker, mutator and reverter.
//!
//! [`DiskSource`] is the real filesystem. [`MemorySource`] is an in-memory
//! tree for tests, with per-path failure injection.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    /// Symlinks, sockets and the like. Never followed or processed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// The operations the walker needs from a filesystem
pub trait EntrySource {
    /// Kind of `path` without following symlinks
    fn kind(&self, path: &Path) -> io::Result<EntryKind>;

    /// Kind of the walk root. Unlike entries below it, a symlinked root is
    /// resolved, since the user named it explicitly.
    fn root_kind(&self, path: &Path) -> io::Result<EntryKind> {
        self.kind(path)
    }

    /// Direct children of `dir`, sorted by file name
    fn list_children(&self, dir: &Path) -> io::Result<Vec<Entry>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSource;

impl EntrySource for DiskSource {
    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        // Use symlink_metadata to avoid following symlinks
        let metadata = fs::symlink_metadata(path)?;
        Ok(kind_of(metadata.file_type()))
    }

    fn root_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = fs::metadata(path)?;
        Ok(kind_of(metadata.file_type()))
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let listing = fs::read_dir(dir)?.map(|entry_result| {
            entry_result.map(|entry| (entry.path(), entry.file_type().map(kind_of)))
        });
        Ok(collect_entries(dir, listing))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Gather a directory listing, sorted by file name. A bad entry is logged and
/// skipped so that it only costs itself, not its siblings.
fn collect_entries<I>(dir: &Path, listing: I) -> Vec<Entry>
where
    I: IntoIterator<Item = io::Result<(PathBuf, io::Result<EntryKind>)>>,
{
    let mut entries = Vec::new();
    for entry_result in listing {
        let (path, kind) = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        match kind {
            Ok(kind) => entries.push(Entry { path, kind }),
            Err(err) => warn!("Skipping (access error): {}: {}", path.display(), err),
        }
    }
    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    entries
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Other
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

/// Operations that can be denied on a [`MemorySource`] path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    List,
    Read,
    Write,
    Remove,
}

/// In-memory tree. Directories are implied by the files added under them.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    symlinks: RefCell<BTreeSet<PathBuf>>,
    denied: RefCell<BTreeSet<(PathBuf, Access)>>,
    reads: RefCell<Vec<PathBuf>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemorySource::add_file`]
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.add_file(path, contents);
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.as_ref().to_vec());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.dirs.borrow_mut().insert(path.to_path_buf());
    }

    /// Add an entry that lists as [`EntryKind::Other`], like a symlink on disk
    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_parents(path);
        self.symlinks.borrow_mut().insert(path.to_path_buf());
    }

    /// Make `access` on exactly `path` fail with `PermissionDenied`
    pub fn deny(&self, path: impl AsRef<Path>, access: Access) {
        self.denied
            .borrow_mut()
            .insert((path.as_ref().to_path_buf(), access));
    }

    /// Current contents of a file
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.borrow().contains_key(path.as_ref())
    }

    /// Every path passed to a successful or failed `read`, in call order
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.borrow().clone()
    }

    fn add_parents(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check(&self, path: &Path, access: Access) -> io::Result<()> {
        if self
            .denied
            .borrow()
            .contains(&(path.to_path_buf(), access))
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{access:?} denied: {}", path.display()),
            ));
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such entry: {}", path.display()),
    )
}

impl EntrySource for MemorySource {
    fn kind(&self, path: &Path) -> io::Result<EntryKind> {
        if self.dirs.borrow().contains(path) {
            Ok(EntryKind::Dir)
        } else if self.files.borrow().contains_key(path) {
            Ok(EntryKind::File)
        } else if self.symlinks.borrow().contains(path) {
            Ok(EntryKind::Other)
        } else {
            Err(not_found(path))
        }
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        self.check(dir, Access::List)?;
        if !self.dirs.borrow().contains(dir) {
            return Err(not_found(dir));
        }

        let is_child = |p: &Path| p.parent() == Some(dir);
        let mut entries: Vec<Entry> = self
            .dirs
            .borrow()
            .iter()
            .filter(|p| is_child(p.as_path()))
            .map(|p| Entry {
                path: p.clone(),
                kind: EntryKind::Dir,
            })
            .chain(self.files.borrow().keys().filter(|p| is_child(p.as_path())).map(|p| Entry {
                path: p.clone(),
                kind: EntryKind::File,
            }))
            .chain(
                self.symlinks
                    .borrow()
                    .iter()
                    .filter(|p| is_child(p.as_path()))
                    .map(|p| Entry {
                        path: p.clone(),
                        kind: EntryKind::Other,
                    }),
            )
            .collect();
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.borrow_mut().push(path.to_path_buf());
        self.check(path, Access::Read)?;
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check(path, Access::Write)?;
        if self.dirs.borrow().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.dirs.borrow().contains(parent) {
                return Err(not_found(parent));
            }
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.check(path, Access::Remove)?;
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }
}
