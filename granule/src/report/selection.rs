//! Selected-region listing.
//!
//! ```text
//! > solver_main   70
//! > io_flush      20
//! ```
//!
//! Names are padded on the right to the widest name in the whole graph, so
//! listings from successive runs line up.

use granule_common::RegionGraph;
use std::io::{self, Write};

use crate::selection::Selection;

/// Write one line per selected region and return their total coverage.
///
/// Ids missing from `graph` are skipped.
///
/// # Errors
/// Any write failure of `out`.
pub fn write_selection_report<W: Write>(
    graph: &RegionGraph,
    selection: &Selection,
    out: &mut W,
) -> io::Result<f64> {
    let width = graph.name_width();
    let mut total = 0.0;
    for region in selection.iter().filter_map(|id| graph.region(id)) {
        total += region.coverage;
        writeln!(out, "> {:<width$} {}", region.name, region.coverage)?;
    }
    out.flush()?;
    Ok(total)
}
