//! Region nesting graph.
//!
//! A thin, acyclic-by-construction wrapper over a `petgraph` stable graph,
//! indexed by region id. Regions and nestings are only ever added; selection
//! runs change annotations and nothing else.

use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::region::{Region, RegionId};

#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Region {0} is already in the graph")]
    DuplicateRegion(RegionId),

    #[error("Region {0} is not in the graph")]
    UnknownRegion(RegionId),

    #[error("Region {0} cannot enclose itself")]
    SelfNesting(RegionId),

    #[error("Nesting {parent} -> {child} would create a cycle")]
    Cycle { parent: RegionId, child: RegionId },
}

/// Directed acyclic graph of regions. An edge `a -> b` means `a` encloses `b`.
#[derive(Debug, Clone, Default)]
pub struct RegionGraph {
    inner: StableDiGraph<Region, ()>,
    index: BTreeMap<RegionId, NodeIndex>,
    /// Sum of coverage over the regions selected by the last run.
    coverage: f64,
}

impl RegionGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region.
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateRegion`] if the id is already present.
    pub fn add_region(&mut self, region: Region) -> Result<(), GraphError> {
        if self.index.contains_key(&region.id) {
            return Err(GraphError::DuplicateRegion(region.id));
        }
        let id = region.id;
        let idx = self.inner.add_node(region);
        self.index.insert(id, idx);
        Ok(())
    }

    /// Record that `parent` encloses `child`.
    ///
    /// Duplicate nestings are ignored.
    ///
    /// # Errors
    /// Unknown ids, self nesting, and any edge that would close a cycle.
    pub fn add_nesting(&mut self, parent: RegionId, child: RegionId) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfNesting(parent));
        }
        let p = self.index_of(parent)?;
        let c = self.index_of(child)?;
        if self.inner.find_edge(p, c).is_some() {
            return Ok(());
        }
        if has_path_connecting(&self.inner, c, p, None) {
            return Err(GraphError::Cycle { parent, child });
        }
        self.inner.add_edge(p, c, ());
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: RegionId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.index.get(&id).map(|&idx| &self.inner[idx])
    }

    /// Regions in ascending id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.index.values().map(move |&idx| &self.inner[idx])
    }

    /// Region ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.index.keys().copied()
    }

    /// All `(parent, child)` edges, sorted.
    #[must_use]
    pub fn nestings(&self) -> Vec<(RegionId, RegionId)> {
        let mut edges: Vec<(RegionId, RegionId)> = self
            .inner
            .edge_indices()
            .filter_map(|e| self.inner.edge_endpoints(e))
            .map(|(p, c)| (self.inner[p].id, self.inner[c].id))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Total coverage of the last selection.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    pub fn set_coverage(&mut self, coverage: f64) {
        self.coverage = coverage;
    }

    /// Widest region name, in characters (report alignment).
    #[must_use]
    pub fn name_width(&self) -> usize {
        self.regions().map(|r| r.name.chars().count()).max().unwrap_or(0)
    }

    /// Write `(id, matching, selected)` flags onto the regions.
    ///
    /// Ids that are not in the graph are skipped.
    pub fn apply_annotations<I>(&mut self, flags: I)
    where
        I: IntoIterator<Item = (RegionId, bool, bool)>,
    {
        for (id, matching, selected) in flags {
            if let Some(&idx) = self.index.get(&id) {
                let region = &mut self.inner[idx];
                region.matching = matching;
                region.selected = selected;
            }
        }
    }

    pub(crate) fn inner(&self) -> &StableDiGraph<Region, ()> {
        &self.inner
    }

    pub(crate) fn index_of(&self, id: RegionId) -> Result<NodeIndex, GraphError> {
        self.index.get(&id).copied().ok_or(GraphError::UnknownRegion(id))
    }
}
