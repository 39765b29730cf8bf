//! Engine Module
//!
//! The storage engine: get-info, get, set and remove over a [`FileSystem`].
//!
//! ## Responsibilities
//! - Map uids to record files and validate record headers
//! - Bounds-check partial reads against the declared record size
//! - Replace records atomically (stage in temp file, rename into place)
//! - Clean up the temp file left behind by an interrupted write

use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ItsError, Result};
use crate::fs::{DirFs, FileSystem, FsError, OpenMode};
use crate::record::{
    decode_header, encode_header, CreateFlags, RecordInfo, RecordNamer, Uid, HEADER_SIZE,
};

/// The storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (set/remove): Serialized by `write_lock`
///   - Every `set` stages through the same temp file name, so only ONE
///     write may be in flight at a time
///   - `remove` takes the lock too so it never races a rename onto the
///     same name
///
/// - **Reads** (get_info/get): No lock
///   - Each read opens its own handle; a record is only ever replaced by an
///     atomic rename, so a reader sees either the old or the new file
pub struct Engine<F: FileSystem> {
    /// Filesystem holding the record files
    fs: F,

    /// Maps uids to file names
    namer: RecordNamer,

    /// Serializes write operations (set/remove)
    write_lock: Mutex<()>,
}

impl Engine<DirFs> {
    /// Open or create a directory-backed engine with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the data directory if it doesn't exist
    /// 3. Discard a temp file left by an interrupted write
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let fs = DirFs::open(&config.data_dir, config.sync_writes).map_err(|e| {
            ItsError::StorageFailure(format!(
                "cannot open data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        tracing::debug!("Opened record store in {}", config.data_dir.display());
        Ok(Self::with_filesystem(fs, &config))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }
}

impl<F: FileSystem> Engine<F> {
    /// Create an engine on top of an existing filesystem
    ///
    /// Only `config.prefix` is used; the filesystem is already set up.
    pub fn with_filesystem(fs: F, config: &Config) -> Self {
        let engine = Self {
            fs,
            namer: RecordNamer::new(config.prefix.clone()),
            write_lock: Mutex::new(()),
        };
        engine.discard_temp();
        engine
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Get the size and creation flags of a record
    pub fn get_info(&self, uid: Uid) -> Result<RecordInfo> {
        self.with_record(uid, |_, info| Ok(info))
    }

    /// Read `length` bytes of a record's payload starting at `offset`
    ///
    /// Fails with `InvalidArgument` (and reads nothing) if the range does not
    /// lie within the record's declared size. A short read is a
    /// `StorageFailure`, never a shorter result.
    pub fn get(&self, uid: Uid, offset: u32, length: u32) -> Result<Vec<u8>> {
        let data = self.with_record(uid, |file, info| {
            self.seek_range(file, info, offset, length)?;
            let mut data = vec![0u8; length as usize];
            self.read_exact(file, &mut data)?;
            Ok(data)
        })?;

        tracing::trace!("Read {} bytes at offset {} of uid {:#x}", length, offset, uid);
        Ok(data)
    }

    /// Read `buf.len()` bytes of a record's payload starting at `offset` into `buf`
    ///
    /// Returns the number of bytes written into `buf`, which on success is
    /// always `buf.len()`.
    pub fn get_into(&self, uid: Uid, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let length = u32::try_from(buf.len()).map_err(|_| {
            ItsError::InvalidArgument(format!("read length {} exceeds u32", buf.len()))
        })?;

        self.with_record(uid, |file, info| {
            self.seek_range(file, info, offset, length)?;
            self.read_exact(file, buf)
        })?;

        Ok(buf.len())
    }

    /// Create or replace a record
    ///
    /// Steps (atomic-write protocol):
    /// 1. Write header + payload to the shared temp file
    /// 2. Close it (commits the data)
    /// 3. Rename the temp file over the record's file
    /// 4. Remove the temp file (best effort)
    ///
    /// Either the record is fully replaced or left exactly as it was.
    pub fn set(&self, uid: Uid, data: &[u8], flags: CreateFlags) -> Result<()> {
        if uid == 0 {
            return Err(ItsError::InvalidHandle);
        }
        let length = u32::try_from(data.len()).map_err(|_| {
            ItsError::InvalidArgument(format!("payload of {} bytes exceeds u32", data.len()))
        })?;

        // Acquire write lock: the temp file name is shared by every set
        let _write_guard = self.write_lock.lock();

        let target = self.namer.record_name(uid);
        let temp = self.namer.temp_name();
        let header = encode_header(length, flags);

        let result = self
            .stage(&temp, &header, data)
            .and_then(|()| self.commit(&temp, &target));

        // On success the temp file is already gone and this fails with NotFound
        self.discard_temp();

        match &result {
            Ok(()) => tracing::debug!(
                "Stored uid {:#x} ({} bytes, flags {})",
                uid,
                length,
                flags
            ),
            Err(e) => tracing::debug!("Failed to store uid {:#x}: {}", uid, e),
        }
        result
    }

    /// Delete a record
    pub fn remove(&self, uid: Uid) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        let name = self.namer.record_name(uid);

        // Existence check
        let file = self.fs.open(&name, OpenMode::Read).map_err(|e| match e {
            FsError::NotFound => ItsError::NotFound,
            e => ItsError::StorageFailure(format!("cannot open {}: {}", name, e)),
        })?;
        if let Err(e) = self.fs.close(file) {
            tracing::trace!("Ignoring close error on {}: {}", name, e);
        }

        self.fs
            .remove(&name)
            .map_err(|e| ItsError::StorageFailure(format!("cannot remove {}: {}", name, e)))?;

        tracing::debug!("Removed uid {:#x}", uid);
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the underlying filesystem
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Get the uid → file name mapping
    pub fn namer(&self) -> &RecordNamer {
        &self.namer
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Open a record, decode its header and run `op` with the file positioned
    /// at the payload. The file is closed whatever `op` returns.
    fn with_record<T>(
        &self,
        uid: Uid,
        op: impl FnOnce(&mut F::File, RecordInfo) -> Result<T>,
    ) -> Result<T> {
        let name = self.namer.record_name(uid);
        let mut file = self.fs.open(&name, OpenMode::Read).map_err(|e| match e {
            FsError::NotFound => ItsError::NotFound,
            e => ItsError::StorageFailure(format!("cannot open {}: {}", name, e)),
        })?;

        let result = self.read_header(&mut file, &name).and_then(|info| op(&mut file, info));

        // Read-only handles have nothing to commit
        if let Err(e) = self.fs.close(file) {
            tracing::trace!("Ignoring close error on {}: {}", name, e);
        }
        result
    }

    fn read_header(&self, file: &mut F::File, name: &str) -> Result<RecordInfo> {
        let mut header = [0u8; HEADER_SIZE];
        let n = self.read_up_to(file, &mut header)?;
        decode_header(&header[..n]).map_err(|e| {
            tracing::warn!("Record {} has a corrupt header: {}", name, e);
            e
        })
    }

    /// Check `offset + length` against the record size and seek to `offset`
    fn seek_range(
        &self,
        file: &mut F::File,
        info: RecordInfo,
        offset: u32,
        length: u32,
    ) -> Result<()> {
        let end = offset.checked_add(length).ok_or_else(|| {
            ItsError::InvalidArgument(format!(
                "offset {} + length {} overflows",
                offset, length
            ))
        })?;
        if end > info.size {
            return Err(ItsError::InvalidArgument(format!(
                "range {}..{} exceeds record size {}",
                offset, end, info.size
            )));
        }

        self.skip(file, u64::from(offset))
    }

    /// Advance past `offset` bytes, in steps no larger than the filesystem allows
    fn skip(&self, file: &mut F::File, mut offset: u64) -> Result<()> {
        let step = self.fs.max_seek();
        if step == 0 && offset > 0 {
            return Err(ItsError::StorageFailure(
                "filesystem does not support seeking".to_string(),
            ));
        }

        while offset > step {
            self.fs
                .seek(file, step)
                .map_err(|e| ItsError::StorageFailure(format!("seek failed: {}", e)))?;
            offset -= step;
        }
        if offset > 0 {
            self.fs
                .seek(file, offset)
                .map_err(|e| ItsError::StorageFailure(format!("seek failed: {}", e)))?;
        }
        Ok(())
    }

    /// Read until `buf` is full or the file ends; returns bytes read
    fn read_up_to(&self, file: &mut F::File, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .fs
                .read(file, &mut buf[filled..])
                .map_err(|e| ItsError::StorageFailure(format!("read failed: {}", e)))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn read_exact(&self, file: &mut F::File, buf: &mut [u8]) -> Result<()> {
        let n = self.read_up_to(file, buf)?;
        if n != buf.len() {
            return Err(ItsError::StorageFailure(format!(
                "short read: expected {} bytes, got {}",
                buf.len(),
                n
            )));
        }
        Ok(())
    }

    /// Write header and payload to the temp file and close it
    fn stage(&self, temp: &str, header: &[u8], data: &[u8]) -> Result<()> {
        let mut file = self
            .fs
            .open(temp, OpenMode::Write)
            .map_err(|e| ItsError::StorageFailure(format!("cannot create {}: {}", temp, e)))?;

        let written = self.write_all(&mut file, header).and_then(|()| {
            if data.is_empty() {
                Ok(())
            } else {
                self.write_all(&mut file, data)
            }
        });
        let closed = self.fs.close(file);

        written?;
        closed.map_err(|e| ItsError::InsufficientStorage(format!("cannot commit {}: {}", temp, e)))
    }

    /// Write all of `buf`; any failure or short write means the device is full
    fn write_all(&self, file: &mut F::File, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self
                .fs
                .write(file, &buf[written..])
                .map_err(|e| ItsError::InsufficientStorage(format!("write failed: {}", e)))?;
            if n == 0 {
                return Err(ItsError::InsufficientStorage(format!(
                    "short write: {} of {} bytes",
                    written,
                    buf.len()
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Rename the staged temp file over the record's file
    fn commit(&self, temp: &str, target: &str) -> Result<()> {
        self.fs.rename(temp, target).map_err(|e| match e {
            FsError::NoSpace => {
                ItsError::InsufficientStorage(format!("cannot rename to {}: {}", target, e))
            }
            e => ItsError::StorageFailure(format!("cannot rename to {}: {}", target, e)),
        })
    }

    /// Remove the temp file, ignoring failure
    fn discard_temp(&self) {
        let temp = self.namer.temp_name();
        match self.fs.remove(&temp) {
            Ok(()) => tracing::debug!("Removed temp file {}", temp),
            Err(FsError::NotFound) => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", temp, e),
        }
    }
}
