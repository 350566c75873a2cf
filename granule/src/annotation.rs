//! Per-solve annotation snapshots.
//!
//! Every solve works on its own snapshot of the `matching`/`selected` flags
//! instead of mutating the graph's regions, so several tolerances can be
//! explored at once against one shared, read-only graph. Only the snapshot of
//! the final, operator-targeted solve is written back onto the graph.

use granule_common::{RegionGraph, RegionId};
use std::collections::{BTreeMap, BTreeSet};

use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionFlags {
    /// Error is within the snapshot's tolerance and the region is not listed
    /// as invalid.
    pub matching: bool,
    /// Chosen by the solve that owns this snapshot.
    pub selected: bool,
}

/// Transient flags for every region of a graph, for one error tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotations {
    flags: BTreeMap<RegionId, RegionFlags>,
}

impl Annotations {
    /// Fresh snapshot: a region matches iff its error does not exceed
    /// `tolerance`; nothing is selected.
    #[must_use]
    pub fn for_tolerance(graph: &RegionGraph, tolerance: f64) -> Self {
        let flags = graph
            .regions()
            .map(|r| (r.id, RegionFlags { matching: r.error <= tolerance, selected: false }))
            .collect();
        Self { flags }
    }

    /// Clear `matching` for every region in `invalid`.
    #[must_use]
    pub fn excluding(mut self, invalid: &BTreeSet<RegionId>) -> Self {
        for id in invalid {
            if let Some(flags) = self.flags.get_mut(id) {
                flags.matching = false;
            }
        }
        self
    }

    /// Unknown regions never match.
    #[must_use]
    pub fn is_matching(&self, id: RegionId) -> bool {
        self.flags.get(&id).is_some_and(|f| f.matching)
    }

    #[must_use]
    pub fn is_selected(&self, id: RegionId) -> bool {
        self.flags.get(&id).is_some_and(|f| f.selected)
    }

    /// Set `selected` for exactly the regions in `selection`.
    pub fn mark_selected(&mut self, selection: &Selection) {
        for (&id, flags) in &mut self.flags {
            flags.selected = selection.contains(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, RegionFlags)> + '_ {
        self.flags.iter().map(|(&id, &f)| (id, f))
    }

    /// Copy the flags onto the graph's regions.
    pub fn apply_to(&self, graph: &mut RegionGraph) {
        graph.apply_annotations(self.iter().map(|(id, f)| (id, f.matching, f.selected)));
    }
}
