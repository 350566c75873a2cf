//! Error/coverage trade-off table.
//!
//! One row per tolerance of the ladder, in sweep order:
//!
//! ```text
//! Error,Exec Time
//! 5,60
//! 10,60
//! ...
//! 99.9,95
//! ```
//!
//! Numbers use Rust's shortest round-trip float formatting, so integral
//! values print without a fractional part.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// File name of the table inside the measures directory.
pub const REPORT_FILE_NAME: &str = "table_error.csv";

const HEADER: &str = "Error,Exec Time";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorCoverageRow {
    /// Tolerated error, in percent.
    pub tolerance: f64,
    /// Best coverage floor reached under that tolerance, in percent.
    pub coverage: f64,
}

/// Append-only trade-off table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorCoverageTable {
    rows: Vec<ErrorCoverageRow>,
}

impl ErrorCoverageTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tolerance: f64, coverage: f64) {
        self.rows.push(ErrorCoverageRow { tolerance, coverage });
    }

    #[must_use]
    pub fn rows(&self) -> &[ErrorCoverageRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Coverage recorded for `tolerance` (first matching row).
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn coverage_at(&self, tolerance: f64) -> Option<f64> {
        self.rows.iter().find(|r| r.tolerance == tolerance).map(|r| r.coverage)
    }

    /// Write the CSV, header first.
    ///
    /// # Errors
    /// Any write failure of `out`.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{HEADER}")?;
        for row in &self.rows {
            writeln!(out, "{},{}", row.tolerance, row.coverage)?;
        }
        out.flush()
    }

    /// Create (or truncate) `path` and write the CSV into it.
    ///
    /// # Errors
    /// File creation or write failures.
    pub fn write_to_path(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))
    }
}
