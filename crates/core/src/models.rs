//! Report model types for VaultSweep runs.
//!
//! These types bridge the conflict core and the CLI's human-readable and
//! JSON output. They are snapshots: a report describes one detect (or
//! detect→resolve) cycle and is never persisted by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::{ConflictGroup, CopyStatus, GroupOutcome};

// ---------------------------------------------------------------------------
// Scan report
// ---------------------------------------------------------------------------

/// Summary of one detected group, reduced to paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub original_path: String,
    pub copies: Vec<String>,
}

impl From<&ConflictGroup> for GroupSummary {
    fn from(group: &ConflictGroup) -> Self {
        Self {
            original_path: group.original_path.clone(),
            copies: group.copies.iter().map(|c| c.path().to_string()).collect(),
        }
    }
}

/// Result of a detection-only run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of files enumerated from the vault.
    pub files_scanned: usize,
    pub groups: Vec<GroupSummary>,
}

impl ScanReport {
    pub fn new<'a>(
        files_scanned: usize,
        groups: impl IntoIterator<Item = &'a ConflictGroup>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            files_scanned,
            groups: groups.into_iter().map(GroupSummary::from).collect(),
        }
    }

    /// Total conflict copies across all groups.
    pub fn copy_count(&self) -> usize {
        self.groups.iter().map(|g| g.copies.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Cleanup report
// ---------------------------------------------------------------------------

/// Aggregate counts over every copy outcome in a cleanup run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupTotals {
    pub deleted: usize,
    pub would_delete: usize,
    pub kept: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of a detect→resolve cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub outcomes: Vec<GroupOutcome>,
    pub totals: CleanupTotals,
}

impl CleanupReport {
    pub fn new(
        files_scanned: usize,
        dry_run: bool,
        outcomes: Vec<GroupOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut totals = CleanupTotals::default();
        for copy in outcomes.iter().flat_map(|g| &g.copies) {
            match copy.status {
                CopyStatus::Deleted => totals.deleted += 1,
                CopyStatus::WouldDelete => totals.would_delete += 1,
                CopyStatus::Kept { .. } => totals.kept += 1,
                CopyStatus::Skipped => totals.skipped += 1,
                CopyStatus::DeleteFailed { .. } => totals.failed += 1,
            }
        }

        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            dry_run,
            files_scanned,
            outcomes,
            totals,
        }
    }
}
