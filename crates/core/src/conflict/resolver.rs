//! Conflict cleanup logic.
//!
//! The resolver consumes the detector's groups plus an externally-owned
//! [`Selection`] and, for each selected group, decides copy by copy whether
//! the copy is safe to discard. A copy is discarded iff its full content is
//! byte-identical to the original at comparison time; anything else is kept
//! and surfaced unresolved — the resolver never merges.
//!
//! Per-copy comparisons are independent and run concurrently. Every per-file
//! failure (unreadable content, failed deletion) is absorbed into that
//! copy's outcome; nothing a single file does can abort its siblings or
//! other groups.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::detector::ConflictGroup;
use crate::vault::{FileRef, FileStore};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Externally-owned set of group keys (original paths) selected for cleanup.
///
/// Keeping the selection outside [`ConflictGroup`] leaves the detector's
/// output immutable: the UI (or CLI) flips keys in here between detection
/// and resolution, and the resolver only reads it.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    keys: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every group in `groups`.
    pub fn all(groups: &BTreeMap<String, ConflictGroup>) -> Self {
        Self {
            keys: groups.keys().cloned().collect(),
        }
    }

    pub fn select(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn deselect(&mut self, key: &str) {
        self.keys.remove(key);
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a copy was kept instead of deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// The copy's content differs from the original.
    ContentDiffers,
    /// The copy (or its original) could not be read.
    ReadFailed { detail: String },
}

impl std::fmt::Display for KeepReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentDiffers => write!(f, "content differs"),
            Self::ReadFailed { detail } => write!(f, "read failed: {detail}"),
        }
    }
}

/// Final classification of one conflict copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CopyStatus {
    /// Group not selected; the copy was not examined.
    Skipped,
    /// Byte-identical to the original and deleted.
    Deleted,
    /// Byte-identical to the original; deletion suppressed by dry-run.
    WouldDelete,
    /// Not deleted, with the reason.
    Kept { reason: KeepReason },
    /// Confirmed identical, but the storage collaborator failed to delete.
    DeleteFailed { detail: String },
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "skipped"),
            Self::Deleted => write!(f, "deleted"),
            Self::WouldDelete => write!(f, "would delete"),
            Self::Kept { reason } => write!(f, "kept ({reason})"),
            Self::DeleteFailed { detail } => write!(f, "delete failed: {detail}"),
        }
    }
}

/// Per-copy outcome record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopyOutcome {
    pub path: String,
    #[serde(flatten)]
    pub status: CopyStatus,
}

/// Per-group outcome: one [`CopyOutcome`] for every copy, in the group's
/// `copies` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub original_path: String,
    pub selected: bool,
    pub copies: Vec<CopyOutcome>,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Resolution tuning knobs.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Classify copies but never issue deletions.
    pub dry_run: bool,
    /// Maximum number of concurrent content reads.
    pub max_parallel: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_parallel: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Stateless cleanup resolver.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolve every group, honouring `selection`.
    ///
    /// Takes `groups` by value: a group is processed exactly once per
    /// detect→resolve cycle, so a confirmed-identical copy can never be
    /// scheduled for deletion twice. Unselected groups are reported
    /// `Skipped` per member without a single content read.
    pub async fn resolve(
        store: Arc<dyn FileStore>,
        groups: BTreeMap<String, ConflictGroup>,
        selection: &Selection,
        options: &ResolveOptions,
    ) -> Vec<GroupOutcome> {
        info!(
            groups = groups.len(),
            selected = selection.len(),
            dry_run = options.dry_run,
            "resolving conflicts"
        );

        let limiter = Arc::new(Semaphore::new(options.max_parallel.max(1)));
        let mut outcomes = Vec::with_capacity(groups.len());

        for (key, group) in groups {
            if !selection.is_selected(&key) {
                debug!(original = %key, "group not selected; skipping");
                outcomes.push(GroupOutcome {
                    original_path: key,
                    selected: false,
                    copies: group
                        .copies
                        .iter()
                        .map(|c| CopyOutcome {
                            path: c.path().to_string(),
                            status: CopyStatus::Skipped,
                        })
                        .collect(),
                });
                continue;
            }

            let copies =
                Self::resolve_group(Arc::clone(&store), &group, options, &limiter).await;
            outcomes.push(GroupOutcome {
                original_path: key,
                selected: true,
                copies,
            });
        }

        let deleted = outcomes
            .iter()
            .flat_map(|g| &g.copies)
            .filter(|c| c.status == CopyStatus::Deleted)
            .count();
        info!(deleted, "conflict resolution complete");
        outcomes
    }

    /// Fan out one selected group into independent per-copy comparisons.
    async fn resolve_group(
        store: Arc<dyn FileStore>,
        group: &ConflictGroup,
        options: &ResolveOptions,
        limiter: &Arc<Semaphore>,
    ) -> Vec<CopyOutcome> {
        debug!(original = %group.original_path, copies = group.copies.len(), "cleaning group");

        // Read the original once and share it across the group's workers.
        let original = group.original.clone();
        let store_for_original = Arc::clone(&store);
        let original_bytes =
            match tokio::task::spawn_blocking(move || store_for_original.read(&original)).await {
                Ok(Ok(bytes)) => Arc::new(bytes),
                Ok(Err(e)) => {
                    warn!(original = %group.original_path, error = %e, "original unreadable");
                    return Self::keep_all(group, format!("original unreadable: {e}"));
                }
                Err(e) => {
                    warn!(original = %group.original_path, error = %e, "original read task failed");
                    return Self::keep_all(group, format!("original read task failed: {e}"));
                }
            };

        let mut workers: JoinSet<(usize, CopyOutcome)> = JoinSet::new();
        for (index, copy) in group.copies.iter().cloned().enumerate() {
            let store = Arc::clone(&store);
            let original_bytes = Arc::clone(&original_bytes);
            let limiter = Arc::clone(limiter);
            let dry_run = options.dry_run;
            let path = copy.path().to_string();

            workers.spawn(async move {
                let permit = limiter.acquire_owned().await;
                let result = tokio::task::spawn_blocking(move || {
                    compare_and_clean(&*store, &original_bytes, &copy, dry_run)
                })
                .await;
                drop(permit);

                let status = match result {
                    Ok(status) => status,
                    Err(e) => CopyStatus::Kept {
                        reason: KeepReason::ReadFailed {
                            detail: format!("comparison task failed: {e}"),
                        },
                    },
                };
                (index, CopyOutcome { path, status })
            });
        }

        // Collect into disjoint slots so the report preserves `copies` order
        // regardless of completion order.
        let mut slots: Vec<Option<CopyOutcome>> = vec![None; group.copies.len()];
        while let Some(joined) = workers.join_next().await {
            if let Ok((index, outcome)) = joined {
                slots[index] = Some(outcome);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| CopyOutcome {
                    path: group.copies[index].path().to_string(),
                    status: CopyStatus::Kept {
                        reason: KeepReason::ReadFailed {
                            detail: "comparison worker terminated".into(),
                        },
                    },
                })
            })
            .collect()
    }

    /// Keep every copy in a group with a shared read-failure reason.
    fn keep_all(group: &ConflictGroup, detail: String) -> Vec<CopyOutcome> {
        group
            .copies
            .iter()
            .map(|c| CopyOutcome {
                path: c.path().to_string(),
                status: CopyStatus::Kept {
                    reason: KeepReason::ReadFailed {
                        detail: detail.clone(),
                    },
                },
            })
            .collect()
    }
}

/// Compare one copy against the original's bytes and, when identical,
/// delete it (or report that a dry-run would have).
fn compare_and_clean(
    store: &dyn FileStore,
    original_bytes: &[u8],
    copy: &FileRef,
    dry_run: bool,
) -> CopyStatus {
    let copy_bytes = match store.read(copy) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %copy.path(), error = %e, "copy unreadable; keeping");
            return CopyStatus::Kept {
                reason: KeepReason::ReadFailed {
                    detail: e.to_string(),
                },
            };
        }
    };

    if copy_bytes != original_bytes {
        debug!(path = %copy.path(), "content differs; keeping");
        return CopyStatus::Kept {
            reason: KeepReason::ContentDiffers,
        };
    }

    if dry_run {
        debug!(path = %copy.path(), "identical to original (dry-run)");
        return CopyStatus::WouldDelete;
    }

    match store.delete(copy) {
        Ok(()) => {
            info!(path = %copy.path(), "deleted identical conflict copy");
            CopyStatus::Deleted
        }
        Err(e) => {
            warn!(path = %copy.path(), error = %e, "delete failed");
            CopyStatus::DeleteFailed {
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detector::{ConflictDetector, SuffixPattern};
    use crate::errors::StoreError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that counts reads and records deletions.
    struct MemStore {
        files: Mutex<HashMap<String, Vec<u8>>>,
        reads: AtomicUsize,
        deleted: Mutex<Vec<String>>,
        fail_reads: Vec<String>,
        fail_deletes: Vec<String>,
    }

    impl MemStore {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: Mutex::new(
                    files
                        .iter()
                        .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
                        .collect(),
                ),
                reads: AtomicUsize::new(0),
                deleted: Mutex::new(Vec::new()),
                fail_reads: Vec::new(),
                fail_deletes: Vec::new(),
            }
        }

        fn failing_reads(mut self, paths: &[&str]) -> Self {
            self.fail_reads = paths.iter().map(|p| p.to_string()).collect();
            self
        }

        fn failing_deletes(mut self, paths: &[&str]) -> Self {
            self.fail_deletes = paths.iter().map(|p| p.to_string()).collect();
            self
        }

        fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn deleted_paths(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    impl FileStore for MemStore {
        fn list(&self) -> Result<Vec<FileRef>, StoreError> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .map(|p| FileRef::new(p.as_str()))
                .collect())
        }

        fn read(&self, file: &FileRef) -> Result<Vec<u8>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.iter().any(|p| p == file.path()) {
                return Err(StoreError::io(
                    file.path(),
                    std::io::Error::new(std::io::ErrorKind::Other, "injected read failure"),
                ));
            }
            self.files
                .lock()
                .unwrap()
                .get(file.path())
                .cloned()
                .ok_or_else(|| StoreError::FileNotFound(file.path().to_string()))
        }

        fn delete(&self, file: &FileRef) -> Result<(), StoreError> {
            if self.fail_deletes.iter().any(|p| p == file.path()) {
                return Err(StoreError::io(
                    file.path(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "injected"),
                ));
            }
            self.files.lock().unwrap().remove(file.path());
            self.deleted.lock().unwrap().push(file.path().to_string());
            Ok(())
        }
    }

    fn detect(store: &MemStore) -> BTreeMap<String, ConflictGroup> {
        let files = store.list().unwrap();
        ConflictDetector::detect(&files, &SuffixPattern::default())
    }

    fn status_of<'a>(outcomes: &'a [GroupOutcome], path: &str) -> &'a CopyStatus {
        outcomes
            .iter()
            .flat_map(|g| &g.copies)
            .find(|c| c.path == path)
            .map(|c| &c.status)
            .unwrap()
    }

    #[tokio::test]
    async fn test_identical_copy_deleted_differing_copy_kept() {
        let store = Arc::new(MemStore::new(&[
            ("A.md", "same"),
            ("A 1.md", "same"),
            ("A 2.md", "different"),
        ]));
        let groups = detect(&store);
        let selection = Selection::all(&groups);

        let outcomes = ConflictResolver::resolve(
            store.clone(),
            groups,
            &selection,
            &ResolveOptions::default(),
        )
        .await;

        assert_eq!(*status_of(&outcomes, "A 1.md"), CopyStatus::Deleted);
        assert_eq!(
            *status_of(&outcomes, "A 2.md"),
            CopyStatus::Kept {
                reason: KeepReason::ContentDiffers
            }
        );
        assert_eq!(store.deleted_paths(), vec!["A 1.md"]);
    }

    #[tokio::test]
    async fn test_unselected_group_skipped_without_reads() {
        let store = Arc::new(MemStore::new(&[("A.md", "x"), ("A 1.md", "x")]));
        let groups = detect(&store);

        let outcomes = ConflictResolver::resolve(
            store.clone(),
            groups,
            &Selection::new(),
            &ResolveOptions::default(),
        )
        .await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].selected);
        assert_eq!(*status_of(&outcomes, "A 1.md"), CopyStatus::Skipped);
        assert_eq!(store.read_count(), 0);
        assert!(store.deleted_paths().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_keeps_copy_but_not_siblings() {
        let store = Arc::new(
            MemStore::new(&[
                ("A.md", "same"),
                ("A 1.md", "same"),
                ("A 2.md", "same"),
                ("B.md", "b"),
                ("B 1.md", "b"),
            ])
            .failing_reads(&["A 1.md"]),
        );
        let groups = detect(&store);
        let selection = Selection::all(&groups);

        let outcomes = ConflictResolver::resolve(
            store.clone(),
            groups,
            &selection,
            &ResolveOptions::default(),
        )
        .await;

        assert!(matches!(
            status_of(&outcomes, "A 1.md"),
            CopyStatus::Kept {
                reason: KeepReason::ReadFailed { .. }
            }
        ));
        // Sibling and other-group copies are unaffected.
        assert_eq!(*status_of(&outcomes, "A 2.md"), CopyStatus::Deleted);
        assert_eq!(*status_of(&outcomes, "B 1.md"), CopyStatus::Deleted);
    }

    #[tokio::test]
    async fn test_unreadable_original_keeps_every_copy() {
        let store = Arc::new(
            MemStore::new(&[("A.md", "same"), ("A 1.md", "same")]).failing_reads(&["A.md"]),
        );
        let groups = detect(&store);
        let selection = Selection::all(&groups);

        let outcomes =
            ConflictResolver::resolve(store.clone(), groups, &selection, &ResolveOptions::default())
                .await;

        assert!(matches!(
            status_of(&outcomes, "A 1.md"),
            CopyStatus::Kept {
                reason: KeepReason::ReadFailed { .. }
            }
        ));
        assert!(store.deleted_paths().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_reported_and_processing_continues() {
        let store = Arc::new(
            MemStore::new(&[("A.md", "same"), ("A 1.md", "same"), ("A 2.md", "same")])
                .failing_deletes(&["A 1.md"]),
        );
        let groups = detect(&store);
        let selection = Selection::all(&groups);

        let outcomes =
            ConflictResolver::resolve(store.clone(), groups, &selection, &ResolveOptions::default())
                .await;

        assert!(matches!(
            status_of(&outcomes, "A 1.md"),
            CopyStatus::DeleteFailed { .. }
        ));
        assert_eq!(*status_of(&outcomes, "A 2.md"), CopyStatus::Deleted);
    }

    #[tokio::test]
    async fn test_dry_run_never_deletes() {
        let store = Arc::new(MemStore::new(&[("A.md", "same"), ("A 1.md", "same")]));
        let groups = detect(&store);
        let selection = Selection::all(&groups);
        let options = ResolveOptions {
            dry_run: true,
            ..Default::default()
        };

        let outcomes =
            ConflictResolver::resolve(store.clone(), groups, &selection, &options).await;

        assert_eq!(*status_of(&outcomes, "A 1.md"), CopyStatus::WouldDelete);
        assert!(store.deleted_paths().is_empty());
    }

    #[tokio::test]
    async fn test_outcomes_preserve_copy_order() {
        let store = Arc::new(MemStore::new(&[
            ("A.md", "x"),
            ("A 1.md", "x"),
            ("A 2.md", "y"),
            ("A 3.md", "x"),
        ]));
        let groups = detect(&store);
        let expected: Vec<String> = groups["A.md"]
            .copies
            .iter()
            .map(|c| c.path().to_string())
            .collect();
        let selection = Selection::all(&groups);

        let outcomes =
            ConflictResolver::resolve(store.clone(), groups, &selection, &ResolveOptions::default())
                .await;

        let reported: Vec<String> =
            outcomes[0].copies.iter().map(|c| c.path.clone()).collect();
        assert_eq!(reported, expected);
    }

    #[tokio::test]
    async fn test_selection_round_trip() {
        let store = Arc::new(MemStore::new(&[("A.md", "x"), ("A 1.md", "x")]));
        let groups = detect(&store);

        let mut selection = Selection::new();
        assert!(selection.is_empty());
        selection.select("A.md");
        assert!(selection.is_selected("A.md"));
        selection.deselect("A.md");
        assert!(!selection.is_selected("A.md"));

        let all = Selection::all(&groups);
        assert_eq!(all.len(), 1);
    }
}
