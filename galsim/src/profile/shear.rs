//! Reduced shear and its area-preserving Jacobian.
//!
//! A shear is stored as the reduced shear g = g1 + i·g2 with |g| < 1. It can
//! also be specified by distortion e = (a² − b²)/(a² + b²) or by conformal
//! shear η = ln(a/b), each with a position angle β.

use nalgebra::Matrix2;

use crate::error::{GalSimError, Result};
use crate::units::{Angle, AngleExt};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shear {
    g1: f64,
    g2: f64,
}

impl Shear {
    /// Reduced shear components.
    pub fn new(g1: f64, g2: f64) -> Result<Self> {
        let g = g1.hypot(g2);
        if !(g < 1.0) {
            return Err(GalSimError::InvalidArgument(format!(
                "reduced shear |g| must be < 1, got {g}"
            )));
        }
        Ok(Self { g1, g2 })
    }

    /// Identity shear.
    pub fn zero() -> Self {
        Self { g1: 0.0, g2: 0.0 }
    }

    /// Magnitude and position angle of the reduced shear.
    pub fn from_g_beta(g: f64, beta: Angle) -> Result<Self> {
        let two_beta = 2.0 * beta.as_radians();
        Self::new(g * two_beta.cos(), g * two_beta.sin())
    }

    /// Distortion components.
    pub fn from_e1_e2(e1: f64, e2: f64) -> Result<Self> {
        let e = e1.hypot(e2);
        if !(e < 1.0) {
            return Err(GalSimError::InvalidArgument(format!(
                "distortion |e| must be < 1, got {e}"
            )));
        }
        if e == 0.0 {
            return Ok(Self::zero());
        }
        let g = e / (1.0 + (1.0 - e * e).sqrt());
        Self::new(e1 * g / e, e2 * g / e)
    }

    /// Conformal shear η with position angle β.
    pub fn from_eta_beta(eta: f64, beta: Angle) -> Result<Self> {
        Self::from_g_beta((0.5 * eta).tanh(), beta)
    }

    pub fn g1(&self) -> f64 {
        self.g1
    }

    pub fn g2(&self) -> f64 {
        self.g2
    }

    pub fn g(&self) -> f64 {
        self.g1.hypot(self.g2)
    }

    pub fn beta(&self) -> Angle {
        Angle::from_radians(0.5 * self.g2.atan2(self.g1))
    }

    pub fn e(&self) -> f64 {
        let g = self.g();
        2.0 * g / (1.0 + g * g)
    }

    pub fn eta(&self) -> f64 {
        2.0 * self.g().atanh()
    }

    /// Unit-determinant matrix mapping the unsheared plane onto the sheared one.
    pub fn jacobian(&self) -> Matrix2<f64> {
        let norm = 1.0 / (1.0 - self.g1 * self.g1 - self.g2 * self.g2).sqrt();
        Matrix2::new(
            1.0 + self.g1,
            self.g2,
            self.g2,
            1.0 - self.g1,
        ) * norm
    }
}
