//! Invalid-region list.
//!
//! Regions that failed extraction or replay upstream are recorded one name per
//! line in a flat file. The list is append-only: names are never removed or
//! rewritten. Listed regions stay in the graph; the selector only refuses to
//! select them.

use log::warn;
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::graph::RegionGraph;
use crate::region::RegionId;

/// Names of regions excluded from selection.
#[derive(Debug, Clone)]
pub struct InvalidRegions {
    path: PathBuf,
    names: BTreeSet<String>,
}

impl InvalidRegions {
    /// Read the list at `path`. A missing file is an empty list.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let names = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, names })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Listed names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Append `name` to the list unless it is already there.
    ///
    /// Returns `true` if the name was newly written.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened for append.
    pub fn mark(&mut self, name: &str) -> io::Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return Ok(false);
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{name}")?;
        self.names.insert(name.to_string());
        Ok(true)
    }

    /// Ids of the regions in `graph` whose name is listed, ascending.
    ///
    /// The graph itself is left as is; callers treat these regions as never
    /// eligible for selection.
    #[must_use]
    pub fn listed_in(&self, graph: &RegionGraph) -> BTreeSet<RegionId> {
        graph
            .regions()
            .filter(|region| self.contains(&region.name))
            .inspect(|region| warn!("Skipping invalid region {} ({})", region.name, region.id))
            .map(|region| region.id)
            .collect()
    }
}
