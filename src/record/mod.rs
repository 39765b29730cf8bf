//! Record Module
//!
//! On-disk record format and the uid → file name mapping.
//!
//! ## Responsibilities
//! - Single source of truth for the magic tag and header size
//! - Encode/decode the fixed-size record header
//! - Map a uid to its permanent file name and name the shared temp file
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                    │
//! │ ┌────────────────┬────────────────┬────────────────┐ │
//! │ │ Magic (8)      │ Size u32 LE (4)│ Flags u32 LE(4)│ │
//! │ │ "PSA\0ITS\0"   │                │                │ │
//! │ └────────────────┴────────────────┴────────────────┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Payload (exactly `size` bytes)                       │
//! └──────────────────────────────────────────────────────┘
//! ```

mod header;
mod naming;

pub use header::{decode_header, encode_header, CreateFlags, RecordInfo, HEADER_SIZE, MAGIC};
pub use naming::{RecordNamer, RECORD_SUFFIX, TEMP_STEM};

/// Caller-chosen record identifier. Zero is reserved.
pub type Uid = u64;
