//! Comprehensive error types for the VaultSweep core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Note that a path failing to match the conflict-suffix pattern, or a
//! candidate whose computed original is absent from the vault, are *not*
//! errors — the detector silently skips both. Per-file read and delete
//! failures during resolution are likewise absorbed into per-copy outcomes
//! rather than surfaced here; only failures that prevent producing any
//! result at all use these types.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from the vault storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The vault root does not exist or is not a directory.
    #[error("vault root is not a directory: {0}")]
    NotADirectory(String),

    /// A file handle refers to a path that no longer exists.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Could not find a free slot in the trash directory for a deleted file.
    #[error("trash destination collision for '{path}' after {attempts} attempts")]
    TrashCollision {
        path: String,
        attempts: u32,
    },

    /// Generic I/O wrapper.
    #[error("storage I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Convenience conversions
// ---------------------------------------------------------------------------

// CoreError implements `std::error::Error` via `thiserror`, which means
// `anyhow::Error: From<CoreError>` is already provided by the blanket impl
// in `anyhow`. No manual `From` impl is needed.
