use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::MultiSelect;
use std::path::PathBuf;
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use file_harmony as lib;
use lib::config::Config;
use lib::engine::RenameEngine;
use lib::models::RenameSummary;
use lib::report;
use lib::tags::LoftyTitleReader;
use lib::tree::SelectionTree;

#[derive(Parser)]
#[command(name = "file-harmony", version, about = "Rename audio files to the title stored in their tags")]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the selectable tree for the given files/folders
    Scan {
        /// Files or folders to scan (defaults to the music folder)
        roots: Vec<PathBuf>,
    },
    /// Rename checked audio files to their title tag
    Rename {
        /// Files or folders to process; every file below them is renamed unless --select is given.
        /// Without any, --select is required and offers the music folder
        roots: Vec<PathBuf>,

        /// Pick files and folders interactively instead of taking everything named
        #[arg(long)]
        select: bool,

        /// Report what would be renamed without touching any file
        #[arg(long)]
        dry_run: bool,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,

        /// Print the tree again after the pass, with renamed items under their new names
        #[arg(long)]
        tree: bool,
    },
    /// Validate config file and exit
    ConfigValidate,
}

fn init_logging(cfg: &Config, verbose: u8) -> Result<Option<WorkerGuard>> {
    // Bridge `log` records from dependencies into tracing.
    let _ = LogTracer::init();

    // Honor RUST_LOG if set, otherwise derive the level from -v.
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match &cfg.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "file-harmony.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().with_ansi(false).with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing_subscriber_global::set_global_default(subscriber)
        .context("installing global tracing subscriber")?;
    Ok(guard)
}

/// Roots given on the command line, else the music folder (offered only through the picker), else the working directory.
fn resolve_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    if !roots.is_empty() {
        return roots;
    }
    let fallback = dirs::audio_dir().unwrap_or_else(|| PathBuf::from("."));
    vec![fallback]
}

/// Checkbox picker over every tree item; checking a folder checks its contents.
/// Returns false when the user cancelled.
fn pick_interactively(tree: &mut SelectionTree) -> Result<bool> {
    let ids: Vec<usize> = tree.iter().map(|(id, _)| id).collect();
    let labels: Vec<String> = ids.iter().map(|&id| report::tree_label(tree, id, false)).collect();

    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select files and folders to rename (space toggles, enter confirms)")
        .items(&labels)
        .interact_opt()
        .context("reading selection")?;

    let Some(picked) = picked else { return Ok(false) };
    tree.uncheck_all();
    for idx in picked {
        tree.set_checked(ids[idx], true);
    }
    Ok(true)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // a bare `rename` must never sweep a folder the user did not name
    if let Commands::Rename { roots, select: false, .. } = &cli.command {
        if roots.is_empty() {
            Cli::command()
                .error(
                    clap::error::ErrorKind::MissingRequiredArgument,
                    "name the files or folders to rename, or pass --select to pick them interactively",
                )
                .exit();
        }
    }

    let cfg = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            if matches!(cli.command, Commands::ConfigValidate) {
                eprintln!("Config validation failed: {:#}", e);
                std::process::exit(2);
            }
            return Err(e.context("loading config"));
        }
    };

    let guard = init_logging(&cfg, cli.verbose)?;
    let mut failed = false;

    match cli.command {
        Commands::ConfigValidate => {
            println!("OK");
        }
        Commands::Scan { roots } => {
            let tree = SelectionTree::scan(&resolve_roots(roots), &cfg);
            let stdout = std::io::stdout();
            report::write_tree(&mut stdout.lock(), &tree).context("writing tree")?;
        }
        Commands::Rename { roots, select, dry_run, json, tree: show_tree } => {
            let mut tree = SelectionTree::scan(&resolve_roots(roots), &cfg);
            for e in tree.errors() {
                eprintln!("Skipped {}: {}", e.path.display(), e.message);
            }
            if tree.is_empty() {
                println!("Nothing to rename.");
                return Ok(());
            }

            if select {
                if !pick_interactively(&mut tree)? {
                    println!("Cancelled.");
                    return Ok(());
                }
            } else {
                // only reachable with roots named on the command line
                tree.check_all();
            }

            // snapshot taken before the pass; later toggles have no effect on it
            let selection = tree.checked_files();
            if selection.is_empty() {
                println!("No audio files selected.");
                return Ok(());
            }

            let mut engine = RenameEngine::from_config(LoftyTitleReader::new(), &cfg).dry_run(dry_run);
            let outcomes = engine.run(&selection);
            tree.apply_outcomes(&outcomes);

            if json {
                println!("{}", report::outcomes_json(&outcomes).context("encoding outcomes")?);
            } else {
                let stdout = std::io::stdout();
                report::write_outcomes(&mut stdout.lock(), &outcomes, dry_run).context("writing outcomes")?;
            }

            if show_tree {
                let stdout = std::io::stdout();
                report::write_tree(&mut stdout.lock(), &tree).context("writing tree")?;
            }

            failed = RenameSummary::from_outcomes(&outcomes).has_failures();
        }
    }

    if failed {
        // flush the file appender before exiting
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}
