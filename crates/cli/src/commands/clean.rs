//! `vaultsweep clean` — detect, select, and clean up conflict groups.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dialoguer::{Confirm, MultiSelect};
use indicatif::{ProgressBar, ProgressStyle};

use vaultsweep_core::config::AppConfig;
use vaultsweep_core::conflict::{
    ConflictDetector, ConflictGroup, ConflictResolver, CopyStatus, ResolveOptions, Selection,
    SuffixPattern,
};
use vaultsweep_core::models::CleanupReport;
use vaultsweep_core::vault::{FileStore, LocalVault};

use super::style;

/// Arguments for the clean subcommand.
pub struct CleanArgs {
    pub all: bool,
    pub groups: Vec<String>,
    pub dry_run: bool,
    pub yes: bool,
    pub json: bool,
}

/// Detect conflicts, build a selection, and resolve it.
pub async fn run(config: &AppConfig, args: CleanArgs) -> Result<()> {
    let started_at = Utc::now();
    let vault = Arc::new(LocalVault::from_config(config));
    let files = vault.list().context("failed to enumerate vault files")?;

    let pattern = SuffixPattern::new(&config.vault.extension);
    let groups = ConflictDetector::detect(&files, &pattern);

    if groups.is_empty() {
        if args.json {
            let report = CleanupReport::new(files.len(), args.dry_run, Vec::new(), started_at);
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!();
            println!("{}", style::success("No sync conflicts found"));
            println!();
        }
        return Ok(());
    }

    let selection = build_selection(&groups, &args)?;
    if selection.is_empty() {
        println!("{}", style::warn("No groups selected; nothing to clean"));
        return Ok(());
    }

    if !args.yes && !args.dry_run && !args.json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Compare {} group(s) and move identical copies to trash?",
                selection.len()
            ))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("{}", style::dim("Aborted."));
            return Ok(());
        }
    }

    let options = ResolveOptions {
        dry_run: args.dry_run,
        max_parallel: config.cleanup.max_parallel_reads,
    };

    let spinner = (!args.json).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Comparing conflict copies...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    });

    let outcomes = ConflictResolver::resolve(vault, groups, &selection, &options).await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let report = CleanupReport::new(files.len(), args.dry_run, outcomes, started_at);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Build the group selection from flags, or prompt interactively.
fn build_selection(
    groups: &std::collections::BTreeMap<String, ConflictGroup>,
    args: &CleanArgs,
) -> Result<Selection> {
    if args.all {
        return Ok(Selection::all(groups));
    }

    if !args.groups.is_empty() {
        let mut selection = Selection::new();
        for key in &args.groups {
            if !groups.contains_key(key) {
                anyhow::bail!("no conflict group with original path '{key}'");
            }
            selection.select(key.clone());
        }
        return Ok(selection);
    }

    if args.json || args.yes {
        // Non-interactive invocations must say what to clean; silently
        // deleting every group is too sharp a default.
        anyhow::bail!("non-interactive clean requires --all or --group <ORIGINAL_PATH>");
    }

    let labels: Vec<String> = groups
        .values()
        .map(|g| format!("{} ({} copies)", g.original_path, g.copies.len()))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("Select conflict groups to clean (space to toggle, enter to confirm)")
        .items(&labels)
        .interact()?;

    let keys: Vec<&String> = groups.keys().collect();
    Ok(chosen.into_iter().map(|i| keys[i].clone()).collect())
}

/// Print the per-copy outcome table and totals.
fn print_report(report: &CleanupReport) {
    println!();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Original", "Copy", "Outcome"]);

    for group in &report.outcomes {
        for copy in &group.copies {
            let outcome = match &copy.status {
                CopyStatus::Deleted => style::success("deleted"),
                CopyStatus::WouldDelete => style::warn("would delete"),
                CopyStatus::Skipped => style::dim("skipped"),
                CopyStatus::Kept { .. } | CopyStatus::DeleteFailed { .. } => {
                    style::warn(&copy.status.to_string())
                }
            };
            table.add_row(vec![
                Cell::new(&group.original_path),
                Cell::new(&copy.path),
                Cell::new(outcome),
            ]);
        }
    }

    println!("{table}");
    println!();

    let totals = &report.totals;
    let mut parts = vec![format!("{} deleted", totals.deleted)];
    if report.dry_run {
        parts.push(format!("{} would be deleted", totals.would_delete));
    }
    parts.push(format!("{} kept", totals.kept));
    if totals.skipped > 0 {
        parts.push(format!("{} skipped", totals.skipped));
    }
    if totals.failed > 0 {
        parts.push(format!("{} failed", totals.failed));
    }

    let summary = parts.join(", ");
    if totals.failed > 0 {
        println!("{}", style::error(&summary));
    } else {
        println!("{}", style::success(&summary));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsweep_core::vault::FileRef;

    fn groups(originals: &[&str]) -> std::collections::BTreeMap<String, ConflictGroup> {
        originals
            .iter()
            .map(|o| {
                (
                    o.to_string(),
                    ConflictGroup {
                        original_path: o.to_string(),
                        original: FileRef::new(*o),
                        copies: vec![FileRef::new(format!("{} 2.md", o.trim_end_matches(".md")))],
                    },
                )
            })
            .collect()
    }

    fn args() -> CleanArgs {
        CleanArgs {
            all: false,
            groups: Vec::new(),
            dry_run: false,
            yes: false,
            json: false,
        }
    }

    #[test]
    fn test_all_flag_selects_every_group() {
        let groups = groups(&["A.md", "B.md"]);
        let selection = build_selection(&groups, &CleanArgs { all: true, ..args() }).unwrap();
        assert!(selection.is_selected("A.md"));
        assert!(selection.is_selected("B.md"));
    }

    #[test]
    fn test_group_flag_selects_only_named_groups() {
        let groups = groups(&["A.md", "B.md"]);
        let selection = build_selection(
            &groups,
            &CleanArgs {
                groups: vec!["A.md".into()],
                ..args()
            },
        )
        .unwrap();
        assert!(selection.is_selected("A.md"));
        assert!(!selection.is_selected("B.md"));
    }

    #[test]
    fn test_unknown_group_flag_fails() {
        let groups = groups(&["A.md"]);
        let err = build_selection(
            &groups,
            &CleanArgs {
                groups: vec!["Missing.md".into()],
                ..args()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Missing.md"));
    }

    #[test]
    fn test_non_interactive_without_explicit_choice_fails() {
        let groups = groups(&["A.md"]);

        let err = build_selection(&groups, &CleanArgs { yes: true, ..args() }).unwrap_err();
        assert!(err.to_string().contains("--all"));

        let err = build_selection(&groups, &CleanArgs { json: true, ..args() }).unwrap_err();
        assert!(err.to_string().contains("--all"));
    }

    #[test]
    fn test_non_interactive_with_explicit_all_succeeds() {
        let groups = groups(&["A.md"]);
        let selection = build_selection(
            &groups,
            &CleanArgs {
                json: true,
                all: true,
                ..args()
            },
        )
        .unwrap();
        assert_eq!(selection.len(), 1);
    }
}
