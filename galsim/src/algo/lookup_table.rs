//! Piecewise-linear tabulated functions.
//!
//! Tabulated SEDs and bandpasses are stored as strictly ascending abscissae
//! with one value each. Evaluation interpolates linearly between neighbours
//! and returns zero outside the tabulated range, so a table doubles as a
//! compact-support throughput curve.

use thiserror::Error;

/// Errors that can occur when building a lookup table
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("abscissa and value vectors must have the same length ({x} vs {f})")]
    LengthMismatch { x: usize, f: usize },

    #[error("a table needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("abscissae must be strictly ascending (index {0})")]
    NotAscending(usize),

    #[error("table contains a non-finite entry at index {0}")]
    NonFinite(usize),
}

/// Linearly interpolated function tabulated on ascending abscissae.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    x: Vec<f64>,
    f: Vec<f64>,
}

impl LookupTable {
    /// Build a table from matching abscissa and value vectors.
    ///
    /// # Errors
    /// Returns an error if the vectors differ in length, hold fewer than two
    /// points, contain NaN/infinite entries, or if `x` is not strictly ascending.
    pub fn from_table(x: Vec<f64>, f: Vec<f64>) -> Result<Self, TableError> {
        if x.len() != f.len() {
            return Err(TableError::LengthMismatch {
                x: x.len(),
                f: f.len(),
            });
        }
        if x.len() < 2 {
            return Err(TableError::TooFewPoints(x.len()));
        }
        if let Some(i) = x
            .iter()
            .zip(&f)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(TableError::NonFinite(i));
        }
        for i in 1..x.len() {
            if x[i] <= x[i - 1] {
                return Err(TableError::NotAscending(i));
            }
        }
        Ok(Self { x, f })
    }

    /// Tabulate `func` at the given abscissae.
    pub fn from_fn(x: Vec<f64>, func: impl Fn(f64) -> f64) -> Result<Self, TableError> {
        let f = x.iter().map(|&xi| func(xi)).collect();
        Self::from_table(x, f)
    }

    /// Interpolated value at `x`, or 0.0 outside the tabulated range.
    pub fn at(&self, x: f64) -> f64 {
        let last = self.x.len() - 1;
        if x < self.x[0] || x > self.x[last] {
            return 0.0;
        }
        // First index whose abscissa exceeds x; clamp so x == x_max uses the final segment
        let upper = self.x.partition_point(|&xi| xi <= x).clamp(1, last);
        let lower = upper - 1;
        let t = (x - self.x[lower]) / (self.x[upper] - self.x[lower]);
        self.f[lower] * (1.0 - t) + self.f[upper] * t
    }

    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Tabulated abscissae.
    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    /// Tabulated values.
    pub fn values(&self) -> &[f64] {
        &self.f
    }

    /// Trapezoid-rule integral over the full tabulated range.
    pub fn integrate(&self) -> f64 {
        self.x
            .windows(2)
            .zip(self.f.windows(2))
            .map(|(x, f)| 0.5 * (x[1] - x[0]) * (f[0] + f[1]))
            .sum()
    }
}
