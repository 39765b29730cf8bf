//! Directory-backed filesystem
//!
//! Stores each file under a root directory using the host's file APIs.
//! Data survives process restarts.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{FileSystem, FsError, FsResult, OpenMode};

/// Filesystem rooted at a host directory
///
/// # Durability
///
/// With `sync_writes` enabled, `close` on a written file calls
/// `File::sync_all()` and `rename`/`remove` sync the parent directory, so a
/// renamed record survives power loss.
#[derive(Debug)]
pub struct DirFs {
    root: PathBuf,
    sync_writes: bool,
}

/// Open file in a [`DirFs`]
#[derive(Debug)]
pub struct DirFile {
    file: File,
    mode: OpenMode,
}

impl DirFs {
    /// Open a filesystem rooted at `root`, creating the directory if needed
    pub fn open(root: &Path, sync_writes: bool) -> FsResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            sync_writes,
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a file name
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn sync_parent(&self, path: &Path) {
        if !self.sync_writes {
            return;
        }
        let parent = path.parent().unwrap_or(&self.root);
        if let Err(e) = sync_dir(parent) {
            tracing::warn!("Failed to sync directory {}: {}", parent.display(), e);
        }
    }
}

impl FileSystem for DirFs {
    type File = DirFile;

    fn open(&self, name: &str, mode: OpenMode) -> FsResult<DirFile> {
        let path = self.path_of(name);
        let file = match mode {
            OpenMode::Read => File::open(&path).map_err(FsError::from_io)?,
            OpenMode::Write => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(FsError::from_io)?;
                }
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(FsError::from_io)?
            }
        };
        Ok(DirFile { file, mode })
    }

    fn read(&self, file: &mut DirFile, buf: &mut [u8]) -> FsResult<usize> {
        loop {
            match file.file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FsError::from_io(e)),
            }
        }
    }

    fn write(&self, file: &mut DirFile, buf: &[u8]) -> FsResult<usize> {
        if file.mode != OpenMode::Write {
            return Err(FsError::Device("file not opened for writing".to_string()));
        }
        loop {
            match file.file.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FsError::from_io(e)),
            }
        }
    }

    fn seek(&self, file: &mut DirFile, offset: u64) -> FsResult<()> {
        let max = self.max_seek();
        if offset > max {
            return Err(FsError::SeekOutOfRange {
                requested: offset,
                max,
            });
        }
        file.file
            .seek(SeekFrom::Current(offset as i64))
            .map_err(FsError::from_io)?;
        Ok(())
    }

    fn max_seek(&self) -> u64 {
        i64::MAX as u64
    }

    fn close(&self, file: DirFile) -> FsResult<()> {
        if file.mode == OpenMode::Write {
            let mut inner = file.file;
            inner.flush().map_err(FsError::from_io)?;
            if self.sync_writes {
                inner.sync_all().map_err(FsError::from_io)?;
            }
        }
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let to_path = self.path_of(to);
        fs::rename(self.path_of(from), &to_path).map_err(FsError::from_io)?;
        self.sync_parent(&to_path);
        Ok(())
    }

    fn remove(&self, name: &str) -> FsResult<()> {
        let path = self.path_of(name);
        fs::remove_file(&path).map_err(FsError::from_io)?;
        self.sync_parent(&path);
        Ok(())
    }
}

/// Directories can only be opened for syncing on unix
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
