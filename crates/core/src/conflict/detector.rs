//! Conflict-copy detection logic.
//!
//! Cloud-sync clients resolve a conflicting edit by writing the losing side
//! to a numbered sibling: `Note.md` gains a `Note 2.md`. The detector scans
//! a flat list of vault files for that pattern and groups every copy under
//! the original it shadows. Detection is pure: no I/O, no side effects, and
//! the same input set (in any order) always yields the same groups.

use std::collections::{BTreeMap, HashMap};

use regex_lite::Regex;
use tracing::{debug, info};

use crate::vault::FileRef;

// ---------------------------------------------------------------------------
// Suffix pattern
// ---------------------------------------------------------------------------

/// Compiled matcher for the conflict-copy naming scheme.
///
/// A path is a candidate copy iff it ends in a single space, one or more
/// decimal digits, then the configured extension. The stem match is greedy,
/// so only the *final* space-and-digits run counts: `Meeting 2024 3.md` has
/// stem `Meeting 2024` and suffix `3`, never stem `Meeting` and suffix
/// `2024 3`.
#[derive(Debug, Clone)]
pub struct SuffixPattern {
    extension: String,
    regex: Regex,
}

impl SuffixPattern {
    /// Build a pattern for the given extension (with leading dot).
    pub fn new(extension: &str) -> Self {
        let pattern = format!("^(.*)( [0-9]+){}$", escape(extension));
        // The extension is fully escaped, so compilation cannot fail.
        let regex = Regex::new(&pattern).expect("escaped suffix pattern is always valid");
        Self {
            extension: extension.to_string(),
            regex,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// If `path` names a candidate conflict copy, return the path of the
    /// original it would shadow.
    pub fn original_of(&self, path: &str) -> Option<String> {
        let caps = self.regex.captures(path)?;
        let stem = caps.get(1)?.as_str();
        Some(format!("{}{}", stem, self.extension))
    }
}

impl Default for SuffixPattern {
    fn default() -> Self {
        Self::new(".md")
    }
}

/// Escape regex metacharacters in a literal extension string.
fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() + 2);
    for c in literal.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Conflict group
// ---------------------------------------------------------------------------

/// One detected collision cluster: an original file and the numbered copies
/// shadowing it.
///
/// Groups are rebuilt from scratch on every detection run and carry no
/// selection state — which groups to clean is an externally-owned
/// [`Selection`](super::Selection) handed to the resolver.
#[derive(Debug, Clone)]
pub struct ConflictGroup {
    /// The canonical (non-suffixed) path. Also the group's map key.
    pub original_path: String,
    /// The original file; always present in the detection input.
    pub original: FileRef,
    /// Conflict copies in sorted-input encounter order. Never contains the
    /// original itself.
    pub copies: Vec<FileRef>,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless detector that groups conflict copies under their originals.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Scan `files` for conflict copies and group them by original path.
    ///
    /// The input is first sorted by filename (case-insensitive, with the raw
    /// name and full path as tiebreaks) so that grouping and `copies` order
    /// are deterministic regardless of enumeration order. A candidate whose
    /// de-suffixed original is absent from the input belongs to no group.
    pub fn detect(
        files: &[FileRef],
        pattern: &SuffixPattern,
    ) -> BTreeMap<String, ConflictGroup> {
        info!(count = files.len(), "detecting sync conflicts");

        // Index the full input once for O(1) original lookups.
        let by_path: HashMap<&str, &FileRef> =
            files.iter().map(|f| (f.path(), f)).collect();

        let mut sorted: Vec<&FileRef> = files.iter().collect();
        sorted.sort_by_cached_key(|f| {
            (
                f.name().to_lowercase(),
                f.name().to_string(),
                f.path().to_string(),
            )
        });

        let mut groups: BTreeMap<String, ConflictGroup> = BTreeMap::new();

        for file in sorted {
            let Some(original_path) = pattern.original_of(file.path()) else {
                continue;
            };

            let Some(original) = by_path.get(original_path.as_str()) else {
                debug!(path = %file.path(), "numbered suffix but no original; not a conflict");
                continue;
            };

            // Degenerate case: the pattern matched the original itself. Can
            // only happen when the extension alone parses as a numbered
            // suffix. Treat it as the original, not a copy.
            if file.path() == original_path {
                debug!(path = %file.path(), "candidate is its own original; skipping");
                continue;
            }

            debug!(
                copy = %file.path(),
                original = %original_path,
                "conflict copy detected"
            );

            groups
                .entry(original_path.clone())
                .or_insert_with(|| ConflictGroup {
                    original_path,
                    original: (*original).clone(),
                    copies: Vec::new(),
                })
                .copies
                .push(file.clone());
        }

        info!(count = groups.len(), "conflict detection complete");
        groups
    }
}
