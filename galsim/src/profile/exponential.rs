//! Exponential disk profile.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use rand::{Rng, RngCore};
use rand_distr::Exp1;
use rustfft::num_complex::Complex64;

use super::{hash_f64s, PhotonArray, SurfaceBrightness};
use crate::error::Result;
use crate::gsparams::GsParams;

/// Half-light radius / scale radius for an exponential disk
pub const HLR_FACTOR: f64 = 1.678_346_990_016_660_8;

/// f(r) = F / (2π r₀²) · exp(−r / r₀)
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    scale_radius: f64,
    flux: f64,
    gsparams: GsParams,
}

impl Exponential {
    /// Unit-flux exponential with scale radius `r0` (arcsec).
    ///
    /// # Panics
    /// Panics if `r0` is not strictly positive.
    pub fn from_scale_radius(r0: f64) -> Self {
        assert!(r0 > 0.0, "Exponential scale radius must be positive, got {r0}");
        Self {
            scale_radius: r0,
            flux: 1.0,
            gsparams: GsParams::default(),
        }
    }

    pub fn from_half_light_radius(hlr: f64) -> Self {
        Self::from_scale_radius(hlr / HLR_FACTOR)
    }

    pub fn with_flux(mut self, flux: f64) -> Self {
        self.flux = flux;
        self
    }

    pub fn with_gsparams(mut self, gsparams: GsParams) -> Self {
        self.gsparams = gsparams;
        self
    }

    pub fn scale_radius(&self) -> f64 {
        self.scale_radius
    }

    pub fn half_light_radius(&self) -> f64 {
        self.scale_radius * HLR_FACTOR
    }

    /// Radius (in units of r₀) enclosing all but `folding_threshold` of the flux.
    fn folding_radius(&self) -> f64 {
        // Fixed-point iteration on (1 + R) e^{-R} = threshold
        let threshold = self.gsparams.folding_threshold;
        let mut r = -threshold.ln();
        for _ in 0..20 {
            r = ((1.0 + r) / threshold).ln();
        }
        r
    }
}

impl Hash for Exponential {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_f64s(state, &[self.scale_radius, self.flux]);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for Exponential {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn centroid(&self) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn max_k(&self) -> f64 {
        let t = self.gsparams.maxk_threshold;
        (t.powf(-2.0 / 3.0) - 1.0).sqrt() / self.scale_radius
    }

    fn step_k(&self) -> f64 {
        let r = self
            .folding_radius()
            .max(self.gsparams.stepk_minimum_hlr * HLR_FACTOR);
        PI / (r * self.scale_radius)
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
        self.flux.abs() / (2.0 * PI * self.scale_radius * self.scale_radius)
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        let r0 = self.scale_radius;
        Ok(self.flux / (2.0 * PI * r0 * r0) * (-pos.norm() / r0).exp())
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        let kr0_sq = k.norm_squared() * self.scale_radius * self.scale_radius;
        Complex64::new(self.flux / (1.0 + kr0_sq).powf(1.5), 0.0)
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return Ok(photons);
        }
        let per_photon = self.flux / n as f64;
        for _ in 0..n {
            // r e^{-r} is a Gamma(2) density: the sum of two unit exponentials
            let e1: f64 = rng.sample(Exp1);
            let e2: f64 = rng.sample(Exp1);
            let r = self.scale_radius * (e1 + e2);
            let theta = 2.0 * PI * rng.gen::<f64>();
            photons.push(r * theta.cos(), r * theta.sin(), per_photon);
        }
        Ok(photons)
    }
}
