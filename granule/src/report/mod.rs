//! Report output
//!
//! This module writes the two human-facing products of a selection run:
//! the error/coverage trade-off table (CSV file under the measures directory)
//! and the per-region selection listing (diagnostic stream).

pub mod error_table;
pub mod selection;

pub use error_table::{ErrorCoverageRow, ErrorCoverageTable, REPORT_FILE_NAME};
pub use selection::write_selection_report;
