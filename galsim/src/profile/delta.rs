//! Point source.

use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use ndarray::Array2;
use rand::RngCore;
use rustfft::num_complex::Complex64;

use super::{PhotonArray, SurfaceBrightness, MOCK_INF};
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;

/// All flux concentrated at the origin. Only drawable in Fourier space
/// (after convolution with something of finite `maxK`) or by photon shooting.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaFunction {
    flux: f64,
    gsparams: GsParams,
}

impl Default for DeltaFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaFunction {
    pub fn new() -> Self {
        Self {
            flux: 1.0,
            gsparams: GsParams::default(),
        }
    }

    pub fn with_flux(mut self, flux: f64) -> Self {
        self.flux = flux;
        self
    }

    pub fn with_gsparams(mut self, gsparams: GsParams) -> Self {
        self.gsparams = gsparams;
        self
    }
}

impl Hash for DeltaFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.flux.to_bits().hash(state);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for DeltaFunction {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn centroid(&self) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn max_k(&self) -> f64 {
        MOCK_INF
    }

    fn step_k(&self) -> f64 {
        MOCK_INF
    }

    fn has_hard_edges(&self) -> bool {
        false
    }

    fn is_axisymmetric(&self) -> bool {
        true
    }

    fn is_analytic_x(&self) -> bool {
        false
    }

    fn is_analytic_k(&self) -> bool {
        true
    }

    fn max_sb(&self) -> f64 {
        MOCK_INF
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn x_value(&self, _pos: Vector2<f64>) -> Result<f64> {
        Err(GalSimError::NotAnalyticReal("DeltaFunction"))
    }

    fn k_value(&self, _k: Vector2<f64>) -> Complex64 {
        Complex64::new(self.flux, 0.0)
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        Array2::from_elem((ky.len(), kx.len()), Complex64::new(self.flux, 0.0))
    }

    fn shoot(&self, n: usize, _rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return Ok(photons);
        }
        let per_photon = self.flux / n as f64;
        for _ in 0..n {
            photons.push(0.0, 0.0, per_photon);
        }
        Ok(photons)
    }
}
