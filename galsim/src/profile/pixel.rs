//! Uniform box profile, used as the pixel response.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use ndarray::Array2;
use rand::{Rng, RngCore};
use rustfft::num_complex::Complex64;

use super::{hash_f64s, PhotonArray, SurfaceBrightness};
use crate::error::Result;
use crate::gsparams::GsParams;

/// sin(πu)/(πu)
pub(crate) fn sinc(u: f64) -> f64 {
    if u.abs() < 1.0e-4 {
        // Taylor expansion avoids 0/0
        let pu2 = (PI * u) * (PI * u);
        1.0 - pu2 / 6.0 * (1.0 - pu2 / 20.0)
    } else {
        (PI * u).sin() / (PI * u)
    }
}

/// Constant surface brightness over a `width × height` rectangle centred on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixel {
    width: f64,
    height: f64,
    flux: f64,
    gsparams: GsParams,
}

impl Pixel {
    /// # Panics
    /// Panics unless both sides are strictly positive.
    pub fn new(width: f64, height: f64) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "box sides must be positive, got {width} × {height}"
        );
        Self {
            width,
            height,
            flux: 1.0,
            gsparams: GsParams::default(),
        }
    }

    /// Square pixel response of side `scale`.
    pub fn square(scale: f64) -> Self {
        Self::new(scale, scale)
    }

    pub fn with_flux(mut self, flux: f64) -> Self {
        self.flux = flux;
        self
    }

    pub fn with_gsparams(mut self, gsparams: GsParams) -> Self {
        self.gsparams = gsparams;
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

impl Hash for Pixel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_f64s(state, &[self.width, self.height, self.flux]);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for Pixel {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn centroid(&self) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn max_k(&self) -> f64 {
        2.0 / (self.gsparams.maxk_threshold * self.width.min(self.height))
    }

    fn step_k(&self) -> f64 {
        PI / self.width.max(self.height)
    }

    fn has_hard_edges(&self) -> bool {
        true
    }

    fn is_axisymmetric(&self) -> bool {
        false
    }

    fn is_analytic_x(&self) -> bool {
        true
    }

    fn is_analytic_k(&self) -> bool {
        true
    }

    fn max_sb(&self) -> f64 {
        self.flux.abs() / (self.width * self.height)
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        let inside = pos.x.abs() <= 0.5 * self.width && pos.y.abs() <= 0.5 * self.height;
        Ok(if inside {
            self.flux / (self.width * self.height)
        } else {
            0.0
        })
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        let fx = sinc(k.x * self.width / (2.0 * PI));
        let fy = sinc(k.y * self.height / (2.0 * PI));
        Complex64::new(self.flux * fx * fy, 0.0)
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        let fx: Vec<f64> = kx
            .iter()
            .map(|&k| sinc(k * self.width / (2.0 * PI)))
            .collect();
        let fy: Vec<f64> = ky
            .iter()
            .map(|&k| sinc(k * self.height / (2.0 * PI)))
            .collect();
        Array2::from_shape_fn((ky.len(), kx.len()), |(r, c)| {
            Complex64::new(self.flux * fx[c] * fy[r], 0.0)
        })
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return Ok(photons);
        }
        let per_photon = self.flux / n as f64;
        for _ in 0..n {
            let x = (rng.gen::<f64>() - 0.5) * self.width;
            let y = (rng.gen::<f64>() - 0.5) * self.height;
            photons.push(x, y, per_photon);
        }
        Ok(photons)
    }
}
