//! `vaultsweep scan` — detect conflict groups and report them.

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use vaultsweep_core::config::AppConfig;
use vaultsweep_core::conflict::{ConflictDetector, SuffixPattern};
use vaultsweep_core::models::ScanReport;
use vaultsweep_core::vault::{FileStore, LocalVault};

use super::style;

/// Scan the vault and print detected conflict groups.
pub fn run(config: &AppConfig, json: bool) -> Result<()> {
    let started_at = Utc::now();
    let vault = LocalVault::from_config(config);
    let files = vault.list().context("failed to enumerate vault files")?;

    let pattern = SuffixPattern::new(&config.vault.extension);
    let groups = ConflictDetector::detect(&files, &pattern);
    let report = ScanReport::new(files.len(), groups.values(), started_at);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.groups.is_empty() {
        println!();
        println!(
            "{}",
            style::success(&format!(
                "No sync conflicts found ({} files scanned)",
                report.files_scanned
            ))
        );
        println!();
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style::header(&format!(
            "Sync Conflicts ({} groups, {} copies, {} files scanned)",
            report.groups.len(),
            report.copy_count(),
            report.files_scanned
        ))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Original", "Copies"]);

    for group in &report.groups {
        table.add_row(vec![
            Cell::new(&group.original_path),
            Cell::new(group.copies.join("\n")),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "{}",
        style::dim("Run `vaultsweep clean` to compare and remove identical copies.")
    );
    println!();

    Ok(())
}
