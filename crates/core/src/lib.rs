//! VaultSweep core library.
//!
//! This crate provides the foundational components for detecting and cleaning
//! up cloud-sync conflict copies in a note vault: configuration, the vault
//! storage boundary, conflict detection and resolution, and report models.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod models;
pub mod vault;

// Re-exports for convenience.
pub use config::AppConfig;
pub use conflict::{ConflictDetector, ConflictGroup, ConflictResolver, Selection};
pub use vault::{FileRef, FileStore, LocalVault};
