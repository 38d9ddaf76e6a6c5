//! VaultSweep command-line tool.
//!
//! Provides subcommands for scanning a vault for sync-conflict copies,
//! cleaning selected conflict groups, and generating / validating
//! configuration files.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vaultsweep_core::config::AppConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// VaultSweep command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "vaultsweep",
    version,
    about = "Detect and clean up cloud-sync conflict copies in a note vault"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults to ./vaultsweep.toml,
    /// then the platform config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vault root directory; overrides the configured root and lets scan /
    /// clean run without any config file.
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the vault and list detected conflict groups.
    Scan {
        /// Emit the scan report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Scan, select conflict groups, and clean up identical copies.
    Clean {
        /// Clean every detected group without prompting for selection.
        #[arg(long)]
        all: bool,

        /// Clean only the group with this original path (repeatable).
        #[arg(long = "group", value_name = "ORIGINAL_PATH")]
        groups: Vec<String>,

        /// Compare content but never delete anything.
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Emit the cleanup report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./vaultsweep.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    // Minimal logging for CLI; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { ref output, force } => cmd_init(output, cli.vault.as_deref(), force),
        Commands::Validate => cmd_validate(&cli),
        Commands::Scan { json } => {
            let config = load_config(&cli)?;
            commands::scan::run(&config, json)
        }
        Commands::Clean {
            all,
            ref groups,
            dry_run,
            yes,
            json,
        } => {
            let config = load_config(&cli)?;
            let args = commands::clean::CleanArgs {
                all,
                groups: groups.clone(),
                dry_run,
                yes,
                json,
            };
            commands::clean::run(&config, args).await
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Locate and load the configuration, falling back to a synthesized config
/// when `--vault` is the only thing provided.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match config_path(cli) {
        Some(path) => AppConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => {
            let root = cli.vault.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "no configuration file found; pass --config, --vault, or run `vaultsweep init`"
                )
            })?;
            AppConfig::with_root(root)
        }
    };

    if let Some(root) = &cli.vault {
        config.vault.root = root.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Resolution order: explicit flag, ./vaultsweep.toml, platform config dir.
fn config_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(path) = &cli.config {
        return Some(path.clone());
    }

    let local = PathBuf::from("./vaultsweep.toml");
    if local.exists() {
        return Some(local);
    }

    let global = dirs::config_dir()?.join("vaultsweep/config.toml");
    global.exists().then_some(global)
}

fn cmd_init(output: &Path, vault: Option<&Path>, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let root = vault.unwrap_or_else(|| Path::new("."));
    std::fs::write(output, AppConfig::generate_default(root))
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{}",
        commands::style::success(&format!("Wrote {}", output.display()))
    );
    Ok(())
}

fn cmd_validate(cli: &Cli) -> Result<()> {
    let path = config_path(cli)
        .ok_or_else(|| anyhow::anyhow!("no configuration file found; pass --config"))?;
    AppConfig::load(&path)
        .with_context(|| format!("configuration at {} is invalid", path.display()))?;

    println!(
        "{}",
        commands::style::success(&format!("{} is valid", path.display()))
    );
    Ok(())
}
