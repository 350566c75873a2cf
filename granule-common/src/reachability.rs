//! Transitive closure of the nesting relation.
//!
//! Computed once per graph and shared by every consumer that needs ancestor
//! queries (the exclusion constraints of the selector, the property checks in
//! tests). Region graphs are per-program and small, so a DFS from every
//! region is cheap enough: O(n · (n + e)).

use petgraph::visit::Dfs;
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::RegionGraph;
use crate::region::RegionId;

/// Precomputed strict descendant sets.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    descendants: BTreeMap<RegionId, BTreeSet<RegionId>>,
}

impl Reachability {
    /// Compute the closure of `graph`.
    #[must_use]
    pub fn of(graph: &RegionGraph) -> Self {
        let inner = graph.inner();
        let mut descendants = BTreeMap::new();

        for id in graph.ids() {
            let Ok(start) = graph.index_of(id) else {
                continue;
            };
            let mut reached = BTreeSet::new();
            let mut dfs = Dfs::new(inner, start);
            while let Some(node) = dfs.next(inner) {
                if node != start {
                    reached.insert(inner[node].id);
                }
            }
            descendants.insert(id, reached);
        }

        Self { descendants }
    }

    /// True if `descendant` is reachable from `ancestor` through at least one
    /// nesting edge. A region is never its own ancestor.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: RegionId, descendant: RegionId) -> bool {
        self.descendants.get(&ancestor).is_some_and(|d| d.contains(&descendant))
    }

    /// Every `(ancestor, descendant)` pair, ordered by ancestor then
    /// descendant.
    pub fn ancestor_pairs(&self) -> impl Iterator<Item = (RegionId, RegionId)> + '_ {
        self.descendants.iter().flat_map(|(&a, d)| d.iter().map(move |&b| (a, b)))
    }
}
