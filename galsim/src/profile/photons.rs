//! Photon arrays produced by photon shooting.

use nalgebra::{Matrix2, Vector2};
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::image_proc::Image;

/// Positions (arcsec) and signed fluxes of shot photons.
///
/// `correlated` marks arrays whose photons are not independent draws, e.g.
/// photons grouped by the Sum component that produced them. Downstream
/// convolution shuffles one operand when both are correlated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonArray {
    x: Vec<f64>,
    y: Vec<f64>,
    flux: Vec<f64>,
    correlated: bool,
}

impl PhotonArray {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            flux: Vec::with_capacity(n),
            correlated: false,
        }
    }

    pub fn push(&mut self, x: f64, y: f64, flux: f64) {
        self.x.push(x);
        self.y.push(y);
        self.flux.push(flux);
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn total_flux(&self) -> f64 {
        self.flux.iter().sum()
    }

    pub fn is_correlated(&self) -> bool {
        self.correlated
    }

    pub fn set_correlated(&mut self, correlated: bool) {
        self.correlated = correlated;
    }

    pub fn scale_flux(&mut self, factor: f64) {
        for f in &mut self.flux {
            *f *= factor;
        }
    }

    /// Move all photons of `other` onto the end of this array.
    pub fn append(&mut self, mut other: PhotonArray) {
        self.x.append(&mut other.x);
        self.y.append(&mut other.y);
        self.flux.append(&mut other.flux);
        self.correlated |= other.correlated;
    }

    /// Map every position through `p → jac·p + offset`.
    pub fn transform(&mut self, jac: &Matrix2<f64>, offset: &Vector2<f64>) {
        for (x, y) in self.x.iter_mut().zip(self.y.iter_mut()) {
            let p = jac * Vector2::new(*x, *y) + offset;
            *x = p.x;
            *y = p.y;
        }
    }

    /// Convolve with another array of the same length: positions add and
    /// fluxes multiply (rescaled by N so the total flux is the product of
    /// the two totals).
    ///
    /// # Panics
    /// Panics if the arrays differ in length.
    pub fn convolve(&mut self, other: &PhotonArray, rng: &mut dyn RngCore) {
        assert_eq!(
            self.len(),
            other.len(),
            "cannot convolve photon arrays of different lengths"
        );
        let n = self.len();
        let mut order: Vec<usize> = (0..n).collect();
        if self.correlated && other.correlated {
            order.shuffle(rng);
        }
        for (i, &j) in order.iter().enumerate() {
            self.x[i] += other.x[j];
            self.y[i] += other.y[j];
            self.flux[i] *= other.flux[j] * n as f64;
        }
        self.correlated |= other.correlated;
    }

    /// Bin photons into `image` (adding to existing values), returning the
    /// flux that landed inside it.
    pub fn add_to_image(&self, image: &mut Image) -> f64 {
        let scale = image.scale();
        let (nx, ny) = (image.nx() as f64, image.ny() as f64);
        let data = image.array_mut();
        let mut added = 0.0;
        for ((&x, &y), &f) in self.x.iter().zip(&self.y).zip(&self.flux) {
            // Column c covers [(c - nx/2)·s, (c + 1 - nx/2)·s)
            let col = (x / scale + nx / 2.0).floor();
            let row = (y / scale + ny / 2.0).floor();
            if col >= 0.0 && col < nx && row >= 0.0 && row < ny {
                data[[row as usize, col as usize]] += f;
                added += f;
            }
        }
        added
    }
}
