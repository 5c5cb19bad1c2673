use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser, ValueEnum};
use colored::Colorize;
use logstrip::{DiskSource, Mode, PathFilter, StatementScanner, SweepConfig, Walker};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find, strip and restore console.log statements across a source tree",
    long_about = None
)]
struct Args {
    /// Directory to scan
    directory_path: PathBuf,

    /// Omit to list matches; `delete` strips them, `revert` restores backups
    #[arg(value_enum)]
    action: Option<Action>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Remove matched statements and create backup files
    Delete,
    /// Restore files from their backups and remove the backups
    Revert,
}

fn mode_for(action: Option<Action>) -> Mode {
    match action {
        None => Mode::Report,
        Some(Action::Delete) => Mode::Remove,
        Some(Action::Revert) => Mode::Revert,
    }
}

fn print_usage(config: &SweepConfig) {
    println!(
        "{}",
        "Usage: logstrip <directory_path> [delete|revert]".bold()
    );
    println!(
        "  - Without argument: Find all {} statements",
        config.target_call
    );
    println!(
        "  - delete: Remove {} statements and create {} files",
        config.target_call, config.backup_suffix
    );
    println!(
        "  - revert: Restore files from {} files and remove the backups",
        config.backup_suffix
    );
}

fn init_logging() {
    // Diagnostics go to stderr; stdout carries only the report lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = SweepConfig::builtin()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            // clap writes the specific complaint to stderr
            err.print().ok();
            print_usage(&config);
            process::exit(1);
        }
    };

    let mode = mode_for(args.action);
    let source = DiskSource;
    let filter = PathFilter::new(&config);
    let scanner = StatementScanner::from_config(&config);
    let walker = Walker::new(&source, &filter, &scanner, &config.backup_suffix);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = walker
        .walk(&args.directory_path, mode, &mut out)
        .context("Error walking through directory")?;
    out.flush()?;

    info!(
        ?mode,
        files_scanned = summary.files_scanned,
        matches = summary.matches,
        files_updated = summary.files_updated,
        files_reverted = summary.files_reverted,
        failures = summary.failures,
        inaccessible = summary.inaccessible,
        "Walk complete"
    );

    Ok(())
}
