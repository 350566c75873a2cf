//! Region identity and per-region measures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region handle
///
/// Stable identity of a region across load/save cycles. Distinct from the
/// display name, which need not be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A profiled program region that may be replayed at coarse granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,

    /// Display name (e.g. the outlined loop symbol).
    pub name: String,

    /// Approximation error of coarse replay, in percent.
    pub error: f64,

    /// Share of total execution time, in percent.
    pub coverage: f64,

    /// Error is within the tolerance of the last selection run.
    #[serde(default)]
    pub matching: bool,

    /// Chosen by the last selection run.
    #[serde(default)]
    pub selected: bool,
}

impl Region {
    /// Create an unannotated region.
    pub fn new(id: u32, name: impl Into<String>, error: f64, coverage: f64) -> Self {
        Self {
            id: RegionId(id),
            name: name.into(),
            error,
            coverage,
            matching: false,
            selected: false,
        }
    }
}
