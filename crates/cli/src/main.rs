//! branchsync command-line tool.
//!
//! Merges a set of peer branches into the current branch, pushes it, then
//! carries the result back into every peer. Also generates and validates
//! configuration files.

mod prompt;
mod reporter;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use branchsync_core::config::{default_config_path, DEFAULT_CONFIG_TEMPLATE};
use branchsync_core::conflict::CommandEditor;
use branchsync_core::git::SystemRunner;
use branchsync_core::{BranchName, SyncConfig, SyncOrchestrator, SyncSummary};

use crate::prompt::TerminalConfirmer;
use crate::reporter::{render_summary, ConsoleReporter};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Keep sibling branches in step with the current branch.
#[derive(Parser, Debug)]
#[command(
    name = "branchsync",
    version,
    about = "Merge peer branches into the current branch and push the result back to each"
)]
struct Cli {
    /// Path to the TOML configuration file
    /// (default: ~/.config/branchsync/config.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Run against this working directory instead of the current one.
    #[arg(short = 'C', long = "repo", global = true, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Show debug logging.
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize the current branch with one or more peer branches.
    Sync {
        /// Peer branches, merged and updated in the order given.
        #[arg(required = true, num_args = 1..)]
        branches: Vec<String>,

        /// Ask for confirmation before touching any branch.
        #[arg(long)]
        confirm: bool,

        /// Print the final summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { ref output } => {
            init_tracing(cli.verbose, "warn");
            cmd_init(output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            init_tracing(cli.verbose, "warn");
            cmd_validate(cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync {
            ref branches,
            confirm,
            json,
        } => {
            let config = SyncConfig::load_or_default(cli.config.as_deref())
                .context("failed to load configuration")?;
            init_tracing(cli.verbose, &config.general.log_level);
            cmd_sync(&config, cli.repo.as_deref(), branches, confirm, json)
        }
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_tracing(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_sync(
    config: &SyncConfig,
    repo: Option<&Path>,
    branches: &[String],
    confirm: bool,
    json: bool,
) -> Result<ExitCode> {
    let targets = branches
        .iter()
        .map(|b| BranchName::new(b.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid branch name")?;

    let runner = match repo {
        Some(dir) => SystemRunner::in_dir(dir),
        None => SystemRunner::new(),
    };
    let editor = CommandEditor::new(&runner, &config.editor);
    let confirmer = TerminalConfirmer;
    let orchestrator = SyncOrchestrator::new(&runner, config, &editor, &confirmer)
        .with_confirmation(confirm || config.sync.confirm);

    let mut reporter = if json {
        ConsoleReporter::stderr()
    } else {
        ConsoleReporter::stdout()
    };
    let session = orchestrator.run(&targets, &mut reporter)?;
    drop(reporter);

    let summary = SyncSummary::from_session(&session, orchestrator.remote());
    if json {
        println!(
            "{}",
            summary.to_json().context("failed to serialize summary")?
        );
    } else {
        println!("{}", render_summary(&summary));
    }

    Ok(if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_init(output: Option<&Path>) -> Result<()> {
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("could not determine the config directory")?,
    };

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    std::fs::write(&output, DEFAULT_CONFIG_TEMPLATE).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Edit the editor command and remote if needed");
    println!(
        "  2. Validate with: branchsync validate --config {}",
        output.display()
    );
    println!("  3. Sync: branchsync sync <branch>...");

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("could not determine the config directory")?,
    };
    println!("Validating configuration: {}", path.display());
    println!();

    let config = SyncConfig::load_from_file(&path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Log level     : {}", config.general.log_level);
    println!("  Git binary    : {}", config.git.binary);
    println!("  Remote        : {}", config.git.remote);
    println!(
        "  Fetch         : {}",
        if config.git.fetch_all {
            "all remotes"
        } else {
            "configured remote only"
        }
    );
    println!(
        "  Editor        : {}",
        if config.editor.is_enabled() {
            config.editor.command.as_str()
        } else {
            "disabled"
        }
    );
    println!(
        "  Confirmation  : {}",
        if config.sync.confirm { "on" } else { "off" }
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}
