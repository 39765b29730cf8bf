//! Configuration for itstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ItsError, Result};

/// Main configuration for an itstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for record files when backed by the host filesystem
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── {prefix}0000000000000001.psa_its   (one file per record)
    ///     └── {prefix}tempfile.psa_its           (only while a set is in flight)
    pub data_dir: PathBuf,

    /// Prefix prepended to every record file name (may name a subdirectory)
    pub prefix: String,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// fsync the staged temporary file before it is renamed into place
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./itstore_data"),
            prefix: String::new(),
            sync_writes: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration can produce valid file names
    pub fn validate(&self) -> Result<()> {
        if self.prefix.contains('\0') {
            return Err(ItsError::Config(
                "prefix must not contain NUL bytes".to_string(),
            ));
        }
        if self.prefix.starts_with('/') || self.prefix.starts_with('\\') {
            return Err(ItsError::Config(format!(
                "prefix must be relative to the data directory, got {:?}",
                self.prefix
            )));
        }
        if self.prefix.split(['/', '\\']).any(|part| part == "..") {
            return Err(ItsError::Config(format!(
                "prefix must stay inside the data directory, got {:?}",
                self.prefix
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all record files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the file name prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Enable or disable fsync of staged files
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.config.sync_writes = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
