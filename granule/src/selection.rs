//! Selected region sets.

use granule_common::{Reachability, RegionGraph, RegionId};
use serde::Serialize;
use std::collections::BTreeSet;

/// Regions chosen by one solve, in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection(BTreeSet<RegionId>);

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RegionId) -> bool {
        self.0.insert(id)
    }

    #[must_use]
    pub fn contains(&self, id: RegionId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.0.iter().copied()
    }

    /// Total coverage of the selected regions in `graph`.
    #[must_use]
    pub fn coverage(&self, graph: &RegionGraph) -> f64 {
        self.iter().filter_map(|id| graph.region(id)).map(|r| r.coverage).sum()
    }

    /// First pair of selected regions where one encloses the other, if any.
    #[must_use]
    pub fn nested_pair(&self, reach: &Reachability) -> Option<(RegionId, RegionId)> {
        self.iter()
            .flat_map(|a| self.iter().map(move |b| (a, b)))
            .find(|&(a, b)| reach.is_ancestor(a, b))
    }
}

impl FromIterator<RegionId> for Selection {
    fn from_iter<I: IntoIterator<Item = RegionId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
