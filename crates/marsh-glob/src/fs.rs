//! Filesystem seam: metadata snapshots and the read-only trait the
//! scanner drives.
//!
//! The scanner is generic over [`GlobFs`] so traversal and qualifier logic
//! can be unit-tested against an in-memory filesystem. [`LocalFs`] is the
//! real implementation. Everything here is synchronous and fallible; the
//! filesystem may change between listing and stat, and the engine accepts
//! that race.

use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

/// What kind of filesystem object a metadata snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Socket,
    Fifo,
    BlockDevice,
    CharDevice,
}

/// One point-in-time metadata snapshot of a file.
#[derive(Debug, Clone, Copy)]
pub struct FileMeta {
    pub kind: FileKind,
    /// Full `st_mode`, type bits included.
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u64,
    pub size: u64,
    pub dev: u64,
    pub ino: u64,
    /// Seconds since the epoch.
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl FileMeta {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// A regular file with any execute bit set.
    pub fn is_executable(&self) -> bool {
        self.kind == FileKind::Regular && self.mode & 0o111 != 0
    }

    /// The `ls -F` style classifier character for this file, or a space
    /// for a plain file.
    pub fn type_suffix(&self) -> char {
        match self.kind {
            FileKind::Directory => '/',
            FileKind::Fifo => '|',
            FileKind::CharDevice => '%',
            FileKind::BlockDevice => '#',
            FileKind::Symlink => '@',
            FileKind::Socket => '=',
            FileKind::Regular if self.mode & 0o111 != 0 => '*',
            FileKind::Regular => ' ',
        }
    }
}

/// Minimal read-only filesystem abstraction for the scanner.
///
/// Implement this to run the engine against something other than the real
/// filesystem (the tests use an in-memory tree).
pub trait GlobFs {
    /// List entry names in a directory. `.` and `..` must not appear.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Metadata, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileMeta>;

    /// Metadata of the entry itself, not following symlinks.
    fn lstat(&self, path: &Path) -> io::Result<FileMeta>;
}

/// The real filesystem.
///
/// Relative paths resolve against the process working directory, or
/// against an explicit root when built with [`LocalFs::rooted`] (which
/// keeps tests independent of the process-wide working directory).
#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    root: Option<PathBuf>,
}

impl LocalFs {
    /// Operate on process-relative paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root` instead of the working
    /// directory.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let path = if path.as_os_str().is_empty() {
            Path::new(".")
        } else {
            path
        };
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl GlobFs for LocalFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                // Non-UTF-8 names cannot have been produced by a tokenized
                // word, so they can never match; skip them.
                Err(_) => continue,
            }
        }
        Ok(names)
    }

    fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        fs::metadata(self.resolve(path)).map(|md| meta_from(&md))
    }

    fn lstat(&self, path: &Path) -> io::Result<FileMeta> {
        fs::symlink_metadata(self.resolve(path)).map(|md| meta_from(&md))
    }
}

fn meta_from(md: &fs::Metadata) -> FileMeta {
    let ft = md.file_type();
    let kind = if ft.is_dir() {
        FileKind::Directory
    } else if ft.is_symlink() {
        FileKind::Symlink
    } else if ft.is_socket() {
        FileKind::Socket
    } else if ft.is_fifo() {
        FileKind::Fifo
    } else if ft.is_block_device() {
        FileKind::BlockDevice
    } else if ft.is_char_device() {
        FileKind::CharDevice
    } else {
        FileKind::Regular
    };
    FileMeta {
        kind,
        mode: md.mode(),
        uid: md.uid(),
        gid: md.gid(),
        nlink: md.nlink(),
        size: md.size(),
        dev: md.dev(),
        ino: md.ino(),
        atime: md.atime(),
        mtime: md.mtime(),
        ctime: md.ctime(),
    }
}
