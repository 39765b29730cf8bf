//! # itstore
//!
//! Crash-safe internal trusted storage for small secrets with:
//! - One file per record, addressed by a 64-bit uid
//! - Atomic replacement via stage-then-rename (no journal)
//! - Magic-tagged header for corruption detection
//! - Pluggable filesystem (host directory or in-memory)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Crypto / Provisioning callers               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get_info / get / set / remove
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │            (Single Writer / Multi Reader)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Record    │          │ FileSystem  │
//!   │ (header +   │          │ (DirFs /    │
//!   │  naming)    │          │  MemoryFs)  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use itstore::{Config, CreateFlags, Engine};
//! use itstore::fs::MemoryFs;
//!
//! let engine = Engine::with_filesystem(MemoryFs::new(), &Config::default());
//! engine.set(0x01, b"hello", CreateFlags::NONE).unwrap();
//! assert_eq!(engine.get(0x01, 1, 3).unwrap(), b"ell");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod fs;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ItsError, Result, PSA_SUCCESS};
pub use config::Config;
pub use engine::Engine;
pub use record::{CreateFlags, RecordInfo, Uid};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of itstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
