//! Sync-conflict detection and cleanup.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- finding paths that look like numbered conflict copies
//!    (`Note 2.md`) of an original (`Note.md`) and grouping them.
//! 2. **Resolution** -- for user-selected groups, comparing each copy's
//!    content against the original and discarding byte-identical copies.

pub mod detector;
pub mod resolver;

pub use detector::{ConflictDetector, ConflictGroup, SuffixPattern};
pub use resolver::{
    ConflictResolver, CopyOutcome, CopyStatus, GroupOutcome, KeepReason, ResolveOptions, Selection,
};
