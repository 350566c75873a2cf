//! Run configuration resolved from the command line.
//!
//! Everything is derived from the measures directory unless overridden, and
//! the resulting value is passed explicitly to the selector and the stores.

use std::path::{Path, PathBuf};

use crate::domain::ConfigError;
use crate::report::REPORT_FILE_NAME;
use crate::search::RelaxationSearch;
use crate::selector::SelectorConfig;

use super::args::SelectArgs;

pub const GRAPH_FILE_NAME: &str = "graph.json";
pub const INVALID_LIST_FILE_NAME: &str = "invalid_loops";

#[derive(Debug, Clone)]
pub struct Config {
    pub measures_dir: PathBuf,
    pub graph_path: PathBuf,
    pub invalid_list: Option<PathBuf>,
    pub search: RelaxationSearch,
    pub jobs: usize,
}

impl Config {
    /// Resolve and validate a `select` invocation.
    ///
    /// # Errors
    /// A missing measures directory or invalid search parameters.
    pub fn from_select(measures_dir: &Path, args: &SelectArgs) -> Result<Self, ConfigError> {
        if !measures_dir.is_dir() {
            return Err(ConfigError::MissingMeasuresDir(measures_dir.to_path_buf()));
        }
        if args.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        let search = RelaxationSearch::new(args.max_coverage, args.step)?;

        Ok(Self {
            measures_dir: measures_dir.to_path_buf(),
            graph_path: args.graph.clone().unwrap_or_else(|| measures_dir.join(GRAPH_FILE_NAME)),
            invalid_list: (!args.no_invalid_filter)
                .then(|| invalid_list_path(measures_dir)),
            search,
            jobs: args.jobs,
        })
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.measures_dir.join(REPORT_FILE_NAME)
    }

    #[must_use]
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            report_path: self.report_path(),
            invalid_list: self.invalid_list.clone(),
            search: self.search,
            jobs: self.jobs,
        }
    }
}

/// Location of the invalid-region list inside `measures_dir`.
#[must_use]
pub fn invalid_list_path(measures_dir: &Path) -> PathBuf {
    measures_dir.join(INVALID_LIST_FILE_NAME)
}
