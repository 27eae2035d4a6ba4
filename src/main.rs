//! Fenchurch CLI
//!
//! Command-line interface for syncing the instructions document.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use is_terminal::IsTerminal;
use std::env;
use std::path::PathBuf;

use fenchurch::report::{NOTHING_SELECTED, render_summary};
use fenchurch::{Linker, SyncOptions, gitignore};

#[derive(Parser)]
#[command(name = "fenchurch")]
#[command(
    author,
    version,
    about = "Sync one instructions file to every AI coding assistant"
)]
struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, env = "FENCHURCH_ROOT")]
    path: Option<PathBuf>,

    /// Platform config, relative to the project root (default: ai-config.json)
    #[arg(short, long, env = "FENCHURCH_CONFIG")]
    config: Option<PathBuf>,

    /// Instructions document, relative to the project root (default: prompts/instructions.md)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Only sync these selected platforms (comma-separated ids)
    #[arg(short, long, value_delimiter = ',')]
    only: Option<Vec<String>>,

    /// Show what would be done without making changes
    #[arg(long)]
    dry_run: bool,

    /// Disable .gitignore updates
    #[arg(long)]
    no_gitignore: bool,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let project_root = match cli.path {
        Some(p) => p,
        None => env::current_dir().context("Failed to determine current directory")?,
    };

    let linker = Linker::load(&project_root, cli.config.as_deref())?;

    if let Some(only) = &cli.only {
        for id in only {
            let selected = linker
                .config()
                .enabled()
                .any(|p| p.id.eq_ignore_ascii_case(id));
            if !selected {
                println!(
                    "  {} '{}' is not a selected platform, ignoring",
                    "!".yellow(),
                    id
                );
            }
        }
    }

    let options = SyncOptions {
        dry_run: cli.dry_run,
        only: cli.only,
        source: cli.source,
        ..Default::default()
    };

    println!("{}", "➤ Syncing instructions".cyan().bold());
    let report = linker.sync(&options).await?;

    if report.is_empty() {
        println!("{}", NOTHING_SELECTED.yellow());
        return Ok(());
    }

    if !cli.no_gitignore {
        let entries = report.synced_paths();
        match gitignore::update_gitignore(linker.project_root(), &entries, options.dry_run) {
            Ok(added) if added.is_empty() => {}
            Ok(added) => {
                let verb = if options.dry_run {
                    "Would add"
                } else {
                    "Added"
                };
                println!(
                    "  {} {} {} entries to .gitignore",
                    "✔".green(),
                    verb,
                    added.len()
                );
            }
            Err(e) => {
                eprintln!("  {} Error updating .gitignore: {:#}", "✘".red(), e);
            }
        }
    }

    println!();
    print!("{}", render_summary(&report));

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
