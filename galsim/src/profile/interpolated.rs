//! Surface brightness defined by a sampled image and an interpolation kernel.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use ndarray::Array2;
use rand::{Rng, RngCore};
use rustfft::num_complex::Complex64;

use super::{hash_f64s, Interpolant, PhotonArray, SurfaceBrightness};
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;
use crate::image_proc::Image;

/// f(x, y) = Σ v_rc / s² · K((x − x_c)/s) · K((y − y_r)/s)
///
/// Pixel values are fluxes, so the profile's total flux is the image sum and
/// drawing it back at the native scale and size returns the original pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedImage {
    values: Array2<f64>,
    scale: f64,
    interpolant: Interpolant,
    gsparams: GsParams,
    noise_variance: Option<f64>,
    x_coords: Vec<f64>,
    y_coords: Vec<f64>,
    flux: f64,
    positive_flux: f64,
    negative_flux: f64,
    centroid: Vector2<f64>,
    max_k: f64,
    max_sb: f64,
}

impl InterpolatedImage {
    /// Interpolate `image` with the default quintic kernel.
    pub fn from_image(image: &Image) -> Result<Self> {
        if image.nx() == 0 || image.ny() == 0 {
            return Err(GalSimError::InvalidArgument(
                "cannot interpolate an empty image".to_string(),
            ));
        }
        if let Some(bad) = image.array().iter().find(|v| !v.is_finite()) {
            return Err(GalSimError::InvalidArgument(format!(
                "image contains a non-finite pixel value {bad}"
            )));
        }

        let values = image.array().clone();
        let scale = image.scale();
        let x_coords = image.x_coords();
        let y_coords = image.y_coords();

        let mut flux = 0.0;
        let mut positive_flux = 0.0;
        let mut negative_flux = 0.0;
        let mut moment = Vector2::zeros();
        for ((row, col), &v) in values.indexed_iter() {
            flux += v;
            if v > 0.0 {
                positive_flux += v;
            } else {
                negative_flux -= v;
            }
            moment += Vector2::new(x_coords[col], y_coords[row]) * v;
        }
        let centroid = if flux != 0.0 { moment / flux } else { Vector2::zeros() };
        let max_sb = values.iter().fold(0.0_f64, |m, v| m.max(v.abs())) / (scale * scale);

        Ok(Self {
            values,
            scale,
            interpolant: Interpolant::default(),
            gsparams: GsParams::default(),
            noise_variance: None,
            x_coords,
            y_coords,
            flux,
            positive_flux,
            negative_flux,
            centroid,
            max_k: PI / scale,
            max_sb,
        })
    }

    pub fn with_interpolant(mut self, interpolant: Interpolant) -> Self {
        self.interpolant = interpolant;
        self
    }

    /// Override the band limit, which defaults to the Nyquist wavenumber π/s.
    pub fn with_max_k(mut self, max_k: f64) -> Self {
        self.max_k = max_k;
        self
    }

    pub fn with_noise_variance(mut self, variance: f64) -> Self {
        self.noise_variance = Some(variance);
        self
    }

    pub fn with_gsparams(mut self, gsparams: GsParams) -> Self {
        self.gsparams = gsparams;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn interpolant(&self) -> Interpolant {
        self.interpolant
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Indices of the samples whose kernels reach fractional index `u`.
    fn support(&self, u: f64, len: usize) -> std::ops::Range<usize> {
        let range = self.interpolant.x_range();
        let lo = (u - range).ceil().max(0.0);
        let hi = (u + range).floor().min(len as f64 - 1.0);
        if hi < lo {
            0..0
        } else {
            lo as usize..hi as usize + 1
        }
    }

    fn phases(k: &[f64], coords: &[f64]) -> Array2<Complex64> {
        Array2::from_shape_fn((coords.len(), k.len()), |(i, q)| {
            Complex64::from_polar(1.0, -k[q] * coords[i])
        })
    }
}

impl Hash for InterpolatedImage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "InterpolatedImage".hash(state);
        self.values.dim().hash(state);
        for v in self.values.iter() {
            v.to_bits().hash(state);
        }
        hash_f64s(state, &[self.scale, self.max_k]);
        self.interpolant.hash(state);
        self.noise_variance.map(f64::to_bits).hash(state);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for InterpolatedImage {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn positive_flux(&self) -> f64 {
        self.positive_flux
    }

    fn negative_flux(&self) -> f64 {
        self.negative_flux
    }

    fn centroid(&self) -> Vector2<f64> {
        self.centroid
    }

    fn max_k(&self) -> f64 {
        self.max_k
    }

    fn step_k(&self) -> f64 {
        let (ny, nx) = self.values.dim();
        let half_extent = nx.max(ny) as f64 / 2.0 + self.interpolant.x_range();
        PI / (half_extent * self.scale)
    }

    fn has_hard_edges(&self) -> bool {
        false
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
        self.max_sb
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn noise_variance(&self) -> Option<f64> {
        self.noise_variance
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        let (ny, nx) = self.values.dim();
        let u = pos.x / self.scale + (nx as f64 - 1.0) / 2.0;
        let w = pos.y / self.scale + (ny as f64 - 1.0) / 2.0;
        let cols = self.support(u, nx);
        let mut total = 0.0;
        for row in self.support(w, ny) {
            let ky = self.interpolant.x_value(w - row as f64);
            let line: f64 = cols
                .clone()
                .map(|col| self.values[[row, col]] * self.interpolant.x_value(u - col as f64))
                .sum();
            total += ky * line;
        }
        Ok(total / (self.scale * self.scale))
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        let mut sum = Complex64::new(0.0, 0.0);
        for ((row, col), &v) in self.values.indexed_iter() {
            let phase = -(k.x * self.x_coords[col] + k.y * self.y_coords[row]);
            sum += Complex64::from_polar(v, phase);
        }
        let u = self.scale / (2.0 * PI);
        sum * self.interpolant.u_value(k.x * u) * self.interpolant.u_value(k.y * u)
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        // Σ_rc v_rc e^{−i kx x_c} e^{−i ky y_r} separates into two matrix products.
        let values = self.values.mapv(|v| Complex64::new(v, 0.0));
        let ex = Self::phases(kx, &self.x_coords);
        let ey = Self::phases(ky, &self.y_coords).reversed_axes();
        let mut grid = ey.dot(&values.dot(&ex));
        let u = self.scale / (2.0 * PI);
        let wx: Vec<f64> = kx.iter().map(|&k| self.interpolant.u_value(k * u)).collect();
        for (mut line, &k) in grid.outer_iter_mut().zip(ky) {
            let wy = self.interpolant.u_value(k * u);
            for (z, &w) in line.iter_mut().zip(&wx) {
                *z *= w * wy;
            }
        }
        grid
    }

    /// Photons fall in pixels with probability ∝ |v| and uniformly within a pixel.
    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        let abs_flux = self.positive_flux + self.negative_flux;
        if n == 0 || abs_flux == 0.0 {
            return Ok(photons);
        }
        let cumulative: Vec<f64> = self
            .values
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v.abs();
                Some(*acc)
            })
            .collect();
        let nx = self.values.ncols();
        let per_photon = abs_flux / n as f64;
        for _ in 0..n {
            let target = rng.gen::<f64>() * abs_flux;
            let index = cumulative
                .partition_point(|&c| c <= target)
                .min(cumulative.len() - 1);
            let (row, col) = (index / nx, index % nx);
            let x = self.x_coords[col] + (rng.gen::<f64>() - 0.5) * self.scale;
            let y = self.y_coords[row] + (rng.gen::<f64>() - 0.5) * self.scale;
            let sign = self.values[[row, col]].signum();
            photons.push(x, y, sign * per_photon);
        }
        Ok(photons)
    }
}
