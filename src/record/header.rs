//! Record header codec
//!
//! Encodes and decodes the 16-byte header at the start of every record file.

use std::fmt;

use crate::error::{ItsError, Result};

/// Magic bytes identifying an ITS record file
pub const MAGIC: &[u8; 8] = b"PSA\0ITS\0";

/// Header size: Magic (8) + Size (4) + Flags (4) = 16 bytes
pub const HEADER_SIZE: usize = 16;

/// Size and creation flags of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInfo {
    /// Declared payload length in bytes
    pub size: u32,
    /// Creation flags, returned verbatim
    pub flags: CreateFlags,
}

/// Creation-time attributes of a record
///
/// The engine stores and returns these bits without interpreting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CreateFlags(u32);

impl CreateFlags {
    pub const NONE: CreateFlags = CreateFlags(0);
    pub const WRITE_ONCE: CreateFlags = CreateFlags(1 << 0);
    pub const NO_CONFIDENTIALITY: CreateFlags = CreateFlags(1 << 1);
    pub const NO_REPLAY_PROTECTION: CreateFlags = CreateFlags(1 << 2);

    pub const fn from_bits(bits: u32) -> Self {
        CreateFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CreateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CreateFlags {
    type Output = CreateFlags;

    fn bitor(self, rhs: CreateFlags) -> CreateFlags {
        CreateFlags(self.0 | rhs.0)
    }
}

impl From<u32> for CreateFlags {
    fn from(bits: u32) -> Self {
        CreateFlags(bits)
    }
}

impl fmt::Display for CreateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Encode a record header
///
/// Format: magic (8) + size LE (4) + flags LE (4)
pub fn encode_header(size: u32, flags: CreateFlags) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..8].copy_from_slice(MAGIC);
    header[8..12].copy_from_slice(&size.to_le_bytes());
    header[12..16].copy_from_slice(&flags.bits().to_le_bytes());
    header
}

/// Decode a record header from the bytes read at the start of a record file
///
/// Only the first `HEADER_SIZE` bytes are examined; anything after them is
/// payload. Fails with `CorruptHeader` if fewer bytes are available or the
/// magic tag does not match.
pub fn decode_header(bytes: &[u8]) -> Result<RecordInfo> {
    if bytes.len() < HEADER_SIZE {
        return Err(ItsError::CorruptHeader(format!(
            "truncated header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    if &bytes[0..8] != MAGIC {
        return Err(ItsError::CorruptHeader(format!(
            "invalid magic: {:02x?}",
            &bytes[0..8]
        )));
    }

    let size = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let flags = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    Ok(RecordInfo {
        size,
        flags: CreateFlags(flags),
    })
}
