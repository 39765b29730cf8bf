//! In-memory filesystem for testing.
//!
//! Besides plain storage it can simulate the failures a flash device shows
//! in the field: running out of space, a rename that fails, and power loss
//! at an arbitrary operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{FileSystem, FsError, FsResult, OpenMode};

/// How an injected rename failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameFault {
    /// Rename fails with `FsError::NoSpace`
    NoSpace,
    /// Rename fails with `FsError::Device`
    Device,
}

/// An in-memory filesystem.
///
/// Writes go straight into the stored file, so a file that was being written
/// when a simulated power loss hit is left behind half-written, like on a
/// real device.
///
/// A read handle keeps the contents it opened: a later `rename` or `remove`
/// of that name does not change what the handle reads.
///
/// # Thread Safety
///
/// All state sits behind one mutex; the filesystem can be shared across threads.
///
/// # Example
///
/// ```rust
/// use itstore::fs::{FileSystem, MemoryFs, OpenMode};
///
/// let fs = MemoryFs::new();
/// let mut file = fs.open("a", OpenMode::Write).unwrap();
/// assert_eq!(fs.write(&mut file, b"data").unwrap(), 4);
/// fs.close(file).unwrap();
/// assert_eq!(fs.contents("a"), Some(b"data".to_vec()));
/// ```
#[derive(Debug)]
pub struct MemoryFs {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    files: BTreeMap<String, Arc<Vec<u8>>>,
    capacity: Option<usize>,
    max_seek: u64,
    /// Operations left before simulated power loss; `Some(0)` means the power is out
    power_loss_in: Option<usize>,
    rename_fault: Option<RenameFault>,
    operations: usize,
    open_handles: usize,
}

/// Open file in a [`MemoryFs`]
#[derive(Debug)]
pub struct MemFile {
    name: String,
    mode: OpenMode,
    pos: usize,
    /// Contents seen by a read handle
    opened: Option<Arc<Vec<u8>>>,
}

impl MemoryFs {
    /// Creates an empty filesystem with unlimited capacity.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                files: BTreeMap::new(),
                capacity: None,
                max_seek: i64::MAX as u64,
                power_loss_in: None,
                rename_fault: None,
                operations: 0,
                open_handles: 0,
            }),
        }
    }

    /// Limits the total number of bytes stored across all files.
    ///
    /// Writes that would exceed the limit are cut short.
    pub fn with_capacity(self, bytes: usize) -> Self {
        self.state.lock().capacity = Some(bytes);
        self
    }

    /// Limits the offset a single `seek` call accepts.
    pub fn with_max_seek(self, max: u64) -> Self {
        self.state.lock().max_seek = max;
        self
    }

    /// Simulates power loss: the next `ops` operations succeed, every one
    /// after that fails until [`clear_faults`](Self::clear_faults).
    pub fn power_loss_after(&self, ops: usize) {
        self.state.lock().power_loss_in = Some(ops);
    }

    /// Makes every `rename` fail with the given fault.
    pub fn fail_renames(&self, fault: Option<RenameFault>) {
        self.state.lock().rename_fault = fault;
    }

    /// Restores power and removes injected faults. Files are kept.
    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.power_loss_in = None;
        state.rename_fault = None;
    }

    /// Number of filesystem operations performed so far.
    pub fn operations(&self) -> usize {
        self.state.lock().operations
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Stores a file directly, bypassing fault injection.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.state.lock().files.insert(name.into(), Arc::new(data));
    }

    /// Returns a copy of a file's bytes.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(name).map(|data| data.to_vec())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.state.lock().files.contains_key(name)
    }

    /// Names of all stored files, sorted.
    pub fn file_names(&self) -> Vec<String> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Total bytes stored across all files.
    pub fn used_bytes(&self) -> usize {
        self.state.lock().used_bytes()
    }

    /// Returns a snapshot of every file, for comparing before/after states.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.state
            .lock()
            .files
            .iter()
            .map(|(name, data)| (name.clone(), data.to_vec()))
            .collect()
    }

    /// Replaces every file with the given snapshot.
    pub fn restore(&self, files: BTreeMap<String, Vec<u8>>) {
        self.state.lock().files = files
            .into_iter()
            .map(|(name, data)| (name, Arc::new(data)))
            .collect();
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Counts an operation and fails it if the power is out
    fn tick(&mut self) -> FsResult<()> {
        self.operations += 1;
        match self.power_loss_in {
            Some(0) => Err(FsError::Device("simulated power loss".to_string())),
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn used_bytes(&self) -> usize {
        self.files.values().map(|data| data.len()).sum()
    }
}

impl FileSystem for MemoryFs {
    type File = MemFile;

    fn open(&self, name: &str, mode: OpenMode) -> FsResult<MemFile> {
        let mut state = self.state.lock();
        state.tick()?;

        let opened = match mode {
            OpenMode::Read => Some(Arc::clone(
                state.files.get(name).ok_or(FsError::NotFound)?,
            )),
            OpenMode::Write => {
                state.files.insert(name.to_string(), Arc::new(Vec::new()));
                None
            }
        };
        state.open_handles += 1;

        Ok(MemFile {
            name: name.to_string(),
            mode,
            pos: 0,
            opened,
        })
    }

    fn read(&self, file: &mut MemFile, buf: &mut [u8]) -> FsResult<usize> {
        let mut state = self.state.lock();
        state.tick()?;

        let data = match &file.opened {
            Some(data) => data,
            None => state.files.get(&file.name).ok_or(FsError::NotFound)?,
        };
        if file.pos >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - file.pos);
        buf[..n].copy_from_slice(&data[file.pos..file.pos + n]);
        file.pos += n;
        Ok(n)
    }

    fn write(&self, file: &mut MemFile, buf: &[u8]) -> FsResult<usize> {
        let mut state = self.state.lock();
        state.tick()?;

        if file.mode != OpenMode::Write {
            return Err(FsError::Device("file not opened for writing".to_string()));
        }

        let used = state.used_bytes();
        let capacity = state.capacity;
        let data = state.files.get_mut(&file.name).ok_or(FsError::NotFound)?;
        // Copy on write if a reader still holds these bytes
        let data = Arc::make_mut(data);

        // Only growth past the current end of file consumes capacity
        let growth = (file.pos + buf.len()).saturating_sub(data.len());
        let n = match capacity {
            Some(cap) => {
                let available = cap.saturating_sub(used);
                buf.len().saturating_sub(growth.saturating_sub(available))
            }
            None => buf.len(),
        };
        if n == 0 {
            return Ok(0);
        }

        if data.len() < file.pos + n {
            data.resize(file.pos + n, 0);
        }
        data[file.pos..file.pos + n].copy_from_slice(&buf[..n]);
        file.pos += n;
        Ok(n)
    }

    fn seek(&self, file: &mut MemFile, offset: u64) -> FsResult<()> {
        let mut state = self.state.lock();
        state.tick()?;

        if offset > state.max_seek {
            return Err(FsError::SeekOutOfRange {
                requested: offset,
                max: state.max_seek,
            });
        }
        let offset = usize::try_from(offset)
            .map_err(|_| FsError::Device(format!("seek offset {} too large", offset)))?;
        file.pos = file
            .pos
            .checked_add(offset)
            .ok_or_else(|| FsError::Device("seek past addressable range".to_string()))?;
        Ok(())
    }

    fn max_seek(&self) -> u64 {
        self.state.lock().max_seek
    }

    fn close(&self, _file: MemFile) -> FsResult<()> {
        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
        state.tick()
    }

    fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let mut state = self.state.lock();
        state.tick()?;

        match state.rename_fault {
            Some(RenameFault::NoSpace) => return Err(FsError::NoSpace),
            Some(RenameFault::Device) => {
                return Err(FsError::Device("injected rename failure".to_string()))
            }
            None => {}
        }

        let data = state.files.remove(from).ok_or(FsError::NotFound)?;
        state.files.insert(to.to_string(), data);
        Ok(())
    }

    fn remove(&self, name: &str) -> FsResult<()> {
        let mut state = self.state.lock();
        state.tick()?;

        state.files.remove(name).map(|_| ()).ok_or(FsError::NotFound)
    }
}
