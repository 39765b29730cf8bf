//! Record file naming
//!
//! A uid maps to exactly one file name. The mapping is a pure function of
//! the uid and the configured prefix, which is how a record is found again
//! after a restart.

use super::Uid;

/// Suffix shared by record files and the temp file
pub const RECORD_SUFFIX: &str = ".psa_its";

/// Name of the shared staging file (without prefix and suffix)
pub const TEMP_STEM: &str = "tempfile";

/// Produces file names for records and for the shared temp file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordNamer {
    prefix: String,
}

impl RecordNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// File name for a uid: prefix + hex(upper 32 bits) + hex(lower 32 bits) + suffix
    ///
    /// "0000000000000001.psa_its" for uid 1 with an empty prefix
    pub fn record_name(&self, uid: Uid) -> String {
        format!(
            "{}{:08x}{:08x}{}",
            self.prefix,
            (uid >> 32) as u32,
            (uid & 0xffff_ffff) as u32,
            RECORD_SUFFIX
        )
    }

    /// Name of the staging file used by every `set`
    pub fn temp_name(&self) -> String {
        format!("{}{}{}", self.prefix, TEMP_STEM, RECORD_SUFFIX)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
