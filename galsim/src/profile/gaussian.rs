//! Circular Gaussian profile.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use rustfft::num_complex::Complex64;

use super::{hash_f64s, PhotonArray, SurfaceBrightness};
use crate::error::Result;
use crate::gsparams::GsParams;

/// FWHM / σ for a Gaussian, 2√(2 ln 2)
pub const FWHM_FACTOR: f64 = 2.354_820_045_030_949_3;

/// Half-light radius / σ for a Gaussian, √(2 ln 2)
pub const HLR_FACTOR: f64 = 1.177_410_022_515_474_6;

/// f(r) = F / (2πσ²) · exp(−r² / 2σ²)
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    sigma: f64,
    flux: f64,
    gsparams: GsParams,
}

impl Gaussian {
    /// Unit-flux Gaussian with standard deviation `sigma` (arcsec).
    ///
    /// # Panics
    /// Panics if `sigma` is not strictly positive.
    pub fn from_sigma(sigma: f64) -> Self {
        assert!(sigma > 0.0, "Gaussian sigma must be positive, got {sigma}");
        Self {
            sigma,
            flux: 1.0,
            gsparams: GsParams::default(),
        }
    }

    pub fn from_fwhm(fwhm: f64) -> Self {
        Self::from_sigma(fwhm / FWHM_FACTOR)
    }

    pub fn from_half_light_radius(hlr: f64) -> Self {
        Self::from_sigma(hlr / HLR_FACTOR)
    }

    pub fn with_flux(mut self, flux: f64) -> Self {
        self.flux = flux;
        self
    }

    pub fn with_gsparams(mut self, gsparams: GsParams) -> Self {
        self.gsparams = gsparams;
        self
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn fwhm(&self) -> f64 {
        self.sigma * FWHM_FACTOR
    }

    pub fn half_light_radius(&self) -> f64 {
        self.sigma * HLR_FACTOR
    }
}

impl Hash for Gaussian {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_f64s(state, &[self.sigma, self.flux]);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for Gaussian {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn centroid(&self) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn max_k(&self) -> f64 {
        (-2.0 * self.gsparams.maxk_threshold.ln()).sqrt() / self.sigma
    }

    fn step_k(&self) -> f64 {
        let folding_radius = (-2.0 * self.gsparams.folding_threshold.ln()).sqrt();
        let r = folding_radius.max(self.gsparams.stepk_minimum_hlr * HLR_FACTOR);
        PI / (r * self.sigma)
    }

    fn has_hard_edges(&self) -> bool {
        false
    }

    fn is_axisymmetric(&self) -> bool {
        true
    }

    fn is_analytic_x(&self) -> bool {
        true
    }

    fn is_analytic_k(&self) -> bool {
        true
    }

    fn max_sb(&self) -> f64 {
        self.flux.abs() / (2.0 * PI * self.sigma * self.sigma)
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        let s2 = self.sigma * self.sigma;
        Ok(self.flux / (2.0 * PI * s2) * (-pos.norm_squared() / (2.0 * s2)).exp())
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        let s2 = self.sigma * self.sigma;
        Complex64::new(self.flux * (-0.5 * k.norm_squared() * s2).exp(), 0.0)
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return Ok(photons);
        }
        let per_photon = self.flux / n as f64;
        for _ in 0..n {
            let x: f64 = rng.sample(StandardNormal);
            let y: f64 = rng.sample(StandardNormal);
            photons.push(x * self.sigma, y * self.sigma, per_photon);
        }
        Ok(photons)
    }
}
