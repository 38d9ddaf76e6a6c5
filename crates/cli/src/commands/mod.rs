//! Subcommand implementations for the `vaultsweep` binary.

pub mod clean;
pub mod scan;
pub mod style;
