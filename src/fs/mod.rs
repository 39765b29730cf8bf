//! Filesystem Module
//!
//! The flash-style filesystem the engine stores records in.
//!
//! ## Responsibilities
//! - Open/read/write/seek/close single files by name
//! - Atomic rename that replaces the destination
//! - Remove files
//!
//! The engine owns all record format interpretation; a filesystem only moves
//! bytes. The only atomic primitive is `rename`.
//!
//! ## Implementors
//! - [`DirFs`] - files under a host directory
//! - [`MemoryFs`] - in-memory, with fault injection for tests

mod dir;
mod memory;

pub use dir::{DirFile, DirFs};
pub use memory::{MemFile, MemoryFs, RenameFault};

use thiserror::Error;

/// Result type for filesystem operations
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Errors reported by a filesystem
#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found")]
    NotFound,

    #[error("no space left on device")]
    NoSpace,

    #[error("seek of {requested} bytes exceeds the per-call maximum of {max}")]
    SeekOutOfRange { requested: u64, max: u64 },

    #[error("device error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Classify a host I/O error, recognising missing files and a full disk
    pub fn from_io(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound
        } else if e.raw_os_error().is_some_and(|code| DISK_FULL_CODES.contains(&code)) {
            FsError::NoSpace
        } else {
            FsError::Io(e)
        }
    }
}

/// `ENOSPC` and `EDQUOT`
#[cfg(target_os = "linux")]
const DISK_FULL_CODES: &[i32] = &[28, 122];

/// `ENOSPC` and `EDQUOT`
#[cfg(all(unix, not(target_os = "linux")))]
const DISK_FULL_CODES: &[i32] = &[28, 69];

/// `ERROR_HANDLE_DISK_FULL` and `ERROR_DISK_FULL`
#[cfg(windows)]
const DISK_FULL_CODES: &[i32] = &[39, 112];

#[cfg(not(any(unix, windows)))]
const DISK_FULL_CODES: &[i32] = &[];

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; fails with `NotFound` if the file does not exist
    Read,
    /// Write-only; creates the file or truncates an existing one
    Write,
}

/// A filesystem exposing the primitives the storage engine needs
///
/// # Invariants
///
/// - `rename` is atomic: after a crash `to` holds either its old or its new
///   content, never a mix
/// - `write` may return fewer bytes than requested when the device is full
/// - `seek` moves relative to the current position and fails when `offset`
///   exceeds `max_seek()`
pub trait FileSystem: Send + Sync {
    /// Open file handle
    type File: Send;

    fn open(&self, name: &str, mode: OpenMode) -> FsResult<Self::File>;

    /// Read up to `buf.len()` bytes, returning how many were read (0 at end of file)
    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> FsResult<usize>;

    /// Write up to `buf.len()` bytes, returning how many were written
    fn write(&self, file: &mut Self::File, buf: &[u8]) -> FsResult<usize>;

    /// Advance the file position by `offset` bytes
    fn seek(&self, file: &mut Self::File, offset: u64) -> FsResult<()>;

    /// Largest offset a single `seek` call accepts
    fn max_seek(&self) -> u64;

    /// Close a handle, committing any written data
    fn close(&self, file: Self::File) -> FsResult<()>;

    /// Atomically rename `from` to `to`, replacing `to` if it exists
    fn rename(&self, from: &str, to: &str) -> FsResult<()>;

    fn remove(&self, name: &str) -> FsResult<()>;
}
