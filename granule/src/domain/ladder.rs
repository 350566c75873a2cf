//! Tolerated-error ladder.
//!
//! The trade-off table is always computed over the same ascending sequence of
//! error tolerances, and the operator must pick the final tolerance from it.

use std::fmt;

use super::errors::SelectError;

/// Tolerated error percentages swept to build the error/coverage table.
pub const TOLERATED_ERRORS: [f64; 20] = [
    5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0,
    80.0, 85.0, 90.0, 95.0, 99.9,
];

/// An error tolerance taken from [`TOLERATED_ERRORS`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Accept `percent` only if it is exactly one of the ladder entries.
    ///
    /// # Errors
    /// [`SelectError::ToleranceNotOnLadder`] otherwise. Nearby values are
    /// never rounded onto the ladder.
    #[allow(clippy::float_cmp)]
    pub fn on_ladder(percent: f64) -> Result<Self, SelectError> {
        if TOLERATED_ERRORS.iter().any(|&t| t == percent) {
            Ok(Self(percent))
        } else {
            Err(SelectError::ToleranceNotOnLadder(percent))
        }
    }

    #[must_use]
    pub fn percent(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
