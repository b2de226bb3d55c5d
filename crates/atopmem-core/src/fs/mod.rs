//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The aggregator reads log files and lists directories through the
//! `FileSystem` trait, so it can run against real files or an in-memory
//! [`MockFs`] in tests.

mod mock;

use std::io;
use std::path::{Path, PathBuf};

pub use mock::MockFs;

/// Abstraction for the filesystem operations the aggregator needs.
pub trait FileSystem {
    /// Reads the entire contents of a file as raw bytes.
    ///
    /// No UTF-8 validation happens here; callers decode lossily so a stray
    /// byte in a process command line cannot discard a whole log.
    ///
    /// # Returns
    /// The file contents, or an I/O error if the file cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// Paths of all entries (files and subdirectories), or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
