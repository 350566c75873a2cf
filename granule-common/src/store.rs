//! Region graph persistence.
//!
//! The selector only needs a load/save hand-off; where and how the graph is
//! kept is the store's business. Two implementations are provided:
//!
//! - [`JsonFileStore`] - one JSON document on disk, replaced atomically
//! - [`MemoryStore`] - in-process, for tests and embedding callers

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::graph::{GraphError, RegionGraph};
use crate::region::{Region, RegionId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid region graph in {path}: {source}")]
    Graph { path: PathBuf, source: GraphError },

    #[error("Failed to persist region graph to {0}")]
    Persist(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Load/save hand-off for region graphs.
pub trait RegionStore {
    /// Load the recorded graph. `Ok(None)` means nothing has been recorded.
    ///
    /// # Errors
    /// I/O failures or an unreadable document.
    fn load_graph(&self) -> Result<Option<RegionGraph>, StoreError>;

    /// Replace the recorded graph.
    ///
    /// # Errors
    /// I/O or serialization failures.
    fn save_graph(&self, graph: &RegionGraph) -> Result<(), StoreError>;
}

/// On-disk shape of a region graph.
#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    coverage: f64,
    regions: Vec<Region>,
    #[serde(default)]
    nestings: Vec<(RegionId, RegionId)>,
}

impl GraphDocument {
    fn from_graph(graph: &RegionGraph) -> Self {
        Self {
            coverage: graph.coverage(),
            regions: graph.regions().cloned().collect(),
            nestings: graph.nestings(),
        }
    }

    fn into_graph(self) -> Result<RegionGraph, GraphError> {
        let mut graph = RegionGraph::new();
        for region in self.regions {
            graph.add_region(region)?;
        }
        for (parent, child) in self.nestings {
            graph.add_nesting(parent, child)?;
        }
        graph.set_coverage(self.coverage);
        Ok(graph)
    }
}

/// Region graph kept as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegionStore for JsonFileStore {
    fn load_graph(&self) -> Result<Option<RegionGraph>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document: GraphDocument = serde_json::from_str(&content)?;
        let graph = document
            .into_graph()
            .map_err(|source| StoreError::Graph { path: self.path.clone(), source })?;
        Ok(Some(graph))
    }

    fn save_graph(&self, graph: &RegionGraph) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Write next to the target so the rename stays on one filesystem
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &GraphDocument::from_graph(graph))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.persist(&self.path).map_err(|_| StoreError::Persist(self.path.clone()))?;
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: RefCell<Option<RegionGraph>>,
    saves: RefCell<usize>,
}

impl MemoryStore {
    /// A store with nothing recorded.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_graph(graph: RegionGraph) -> Self {
        Self { graph: RefCell::new(Some(graph)), saves: RefCell::new(0) }
    }

    /// Snapshot of the recorded graph.
    #[must_use]
    pub fn graph(&self) -> Option<RegionGraph> {
        self.graph.borrow().clone()
    }

    /// Number of completed saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl RegionStore for MemoryStore {
    fn load_graph(&self) -> Result<Option<RegionGraph>, StoreError> {
        Ok(self.graph.borrow().clone())
    }

    fn save_graph(&self, graph: &RegionGraph) -> Result<(), StoreError> {
        *self.graph.borrow_mut() = Some(graph.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

impl<S: RegionStore + ?Sized> RegionStore for &S {
    fn load_graph(&self) -> Result<Option<RegionGraph>, StoreError> {
        (**self).load_graph()
    }

    fn save_graph(&self, graph: &RegionGraph) -> Result<(), StoreError> {
        (**self).save_graph(graph)
    }
}
