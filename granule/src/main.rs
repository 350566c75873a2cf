//! # granule - Main Entry Point
//!
//! Subcommands:
//! - **select** (`--error <PERCENT>`): sweep the ladder, select, write reports
//! - **ladder**: print the accepted tolerated-error values
//! - **invalid** (`mark <NAME>` / `list`): maintain the invalid-region list

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use granule_common::{InvalidRegions, JsonFileStore};
use log::{error, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use granule::cli::config::invalid_list_path;
use granule::cli::{Args, Command, Config, InvalidAction, SelectArgs};
use granule::domain::{ConfigError, SelectError, TOLERATED_ERRORS};
use granule::solver::MicroLpBackend;
use granule::GranularitySelector;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NO_GRAPH: i32 = 3;

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    std::process::exit(match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_USAGE;
    }
    match err.downcast_ref::<SelectError>() {
        Some(SelectError::ToleranceNotOnLadder(_)) => EXIT_USAGE,
        Some(SelectError::GraphUnavailable(_)) => EXIT_NO_GRAPH,
        _ => EXIT_ERROR,
    }
}

fn run(args: &Args) -> Result<i32> {
    match &args.command {
        Command::Select(select) => run_select(&args.measures_dir, select, args.quiet),
        Command::Ladder => {
            for tolerance in TOLERATED_ERRORS {
                println!("{tolerance}");
            }
            Ok(EXIT_SUCCESS)
        }
        Command::Invalid { action } => run_invalid(&args.measures_dir, action),
    }
}

fn run_select(measures_dir: &Path, select: &SelectArgs, quiet: bool) -> Result<i32> {
    let config = Config::from_select(measures_dir, select)?;
    let store = JsonFileStore::new(&config.graph_path);

    if !quiet {
        println!("granule v{}", env!("CARGO_PKG_VERSION"));
        println!("graph: {}", config.graph_path.display());
        println!("target error: {}%", select.error);
    }

    let mut selector = GranularitySelector::new(store, MicroLpBackend, config.selector_config());
    let summary = match selector.run(select.error) {
        Ok(summary) => summary,
        Err(SelectError::GraphUnavailable(reason)) => {
            error!(
                "Cannot load graph {} ({reason}). Was the program profiled?",
                config.graph_path.display()
            );
            return Ok(EXIT_NO_GRAPH);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = &select.summary {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)
            .context("Failed to write run summary")?;
        info!("Wrote run summary to {}", path.display());
    }

    if !quiet {
        if summary.regions > 0 {
            println!("report: {}", config.report_path().display());
        }
        println!(
            "selected: {} regions, {}% coverage",
            summary.selection.len(),
            summary.coverage
        );
    }

    Ok(EXIT_SUCCESS)
}

fn run_invalid(measures_dir: &Path, action: &InvalidAction) -> Result<i32> {
    let path = invalid_list_path(measures_dir);
    let mut invalid = InvalidRegions::open(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match action {
        InvalidAction::Mark { name } => {
            if invalid.mark(name).with_context(|| format!("Failed to update {}", path.display()))? {
                info!("Marked {name} as invalid");
            } else {
                info!("{name} is already listed");
            }
        }
        InvalidAction::List => {
            for name in invalid.names() {
                println!("{name}");
            }
        }
    }

    Ok(EXIT_SUCCESS)
}
