//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::search::{DEFAULT_MAX_COVERAGE, DEFAULT_STEP};

#[derive(Parser)]
#[command(
    name = "granule",
    version,
    about = "Select which profiled regions to replay, trading error against coverage",
    after_help = "\
EXAMPLES:
    granule select --error 15                     Select under 15% tolerated error
    granule select --error 15 --jobs 4            Sweep the ladder on 4 threads
    granule ladder                                Show accepted error values
    granule invalid mark loop_42                  Exclude a region from selection"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the graph, reports and invalid-region list
    #[arg(long, global = true, env = "GRANULE_MEASURES_DIR", default_value = ".")]
    pub measures_dir: PathBuf,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log every solve attempt
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sweep the error ladder and select regions for a target error
    Select(SelectArgs),

    /// Print the tolerated-error ladder
    Ladder,

    /// Manage the invalid-region list
    Invalid {
        #[command(subcommand)]
        action: InvalidAction,
    },
}

#[derive(clap::Args)]
pub struct SelectArgs {
    /// Tolerated error in percent (must be a ladder value)
    #[arg(short, long, value_name = "PERCENT")]
    pub error: f64,

    /// Region graph file (default: <MEASURES_DIR>/graph.json)
    #[arg(long, value_name = "FILE")]
    pub graph: Option<PathBuf>,

    /// Highest coverage floor tried
    #[arg(long, default_value_t = DEFAULT_MAX_COVERAGE)]
    pub max_coverage: f64,

    /// Coverage decrement between attempts
    #[arg(long, default_value_t = DEFAULT_STEP)]
    pub step: f64,

    /// Worker threads for the ladder sweep
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Do not drop regions listed as invalid
    #[arg(long)]
    pub no_invalid_filter: bool,

    /// Also write a JSON run summary to FILE
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum InvalidAction {
    /// Append a region name to the list
    Mark { name: String },

    /// Print the listed region names
    List,
}
