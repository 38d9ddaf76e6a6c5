//! TOML-based configuration system for VaultSweep.
//!
//! Configuration is deliberately small: where the vault lives, which files
//! count as notes, and how cleanup behaves. Every field has a default so an
//! empty `[vault]` section with just a `root` is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Vault location and file-matching settings.
    pub vault: VaultConfig,

    /// Cleanup behaviour settings.
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Vault location and file-matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Root directory of the vault to scan.
    pub root: PathBuf,

    /// File extension (with leading dot) that identifies notes.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns for vault-relative paths to skip during enumeration
    /// (e.g. `"Templates/**"`, `".trash/**"`).
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_extension() -> String {
    ".md".into()
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Cleanup behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Vault-relative directory that deleted copies are moved into.
    #[serde(default = "default_trash_dir")]
    pub trash_dir: PathBuf,

    /// Unlink deleted copies permanently instead of moving them to trash.
    #[serde(default)]
    pub permanent: bool,

    /// Maximum number of concurrent content reads during resolution.
    #[serde(default = "default_max_parallel_reads")]
    pub max_parallel_reads: usize,
}

fn default_trash_dir() -> PathBuf {
    PathBuf::from(".trash")
}
fn default_max_parallel_reads() -> usize {
    8
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            trash_dir: default_trash_dir(),
            permanent: false,
            max_parallel_reads: default_max_parallel_reads(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Construct an in-memory configuration with defaults for the given
    /// vault root, as if loaded from a freshly generated config file.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            vault: VaultConfig {
                root: root.into(),
                extension: default_extension(),
                exclude: Vec::new(),
            },
            cleanup: CleanupConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        debug!(path = %path.display(), "loading configuration");
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        info!(vault = %config.vault.root.display(), "configuration loaded");
        Ok(config)
    }

    /// Validate field values beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault.root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "vault.root".into(),
                detail: "must not be empty".into(),
            });
        }

        if !self.vault.extension.starts_with('.') || self.vault.extension.len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "vault.extension".into(),
                detail: format!(
                    "'{}' must be a dot followed by at least one character",
                    self.vault.extension
                ),
            });
        }

        if self.cleanup.max_parallel_reads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cleanup.max_parallel_reads".into(),
                detail: "must be at least 1".into(),
            });
        }

        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "log.level".into(),
                    detail: format!("unknown level '{other}'"),
                });
            }
        }

        Ok(())
    }

    /// Produce a commented default configuration file for `vaultsweep init`.
    pub fn generate_default(vault_root: &Path) -> String {
        format!(
            r#"# VaultSweep configuration.

[vault]
# Root directory of the vault to scan.
root = "{root}"
# File extension (with leading dot) that identifies notes.
extension = ".md"
# Vault-relative glob patterns to skip during enumeration.
exclude = [".trash/**"]

[cleanup]
# Vault-relative directory that deleted conflict copies are moved into.
trash_dir = ".trash"
# Set true to unlink copies permanently instead of moving them to trash.
permanent = false
# Maximum number of concurrent content reads during resolution.
max_parallel_reads = 8

[log]
# Minimum log level: trace, debug, info, warn, error.
level = "info"
"#,
            root = vault_root.display()
        )
    }
}
