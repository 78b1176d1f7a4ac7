//! Convolution of monochromatic profiles.

use std::hash::{Hash, Hasher};

use log::warn;
use nalgebra::Vector2;
use ndarray::Array2;
use rand::RngCore;
use rustfft::num_complex::Complex64;

use super::{PhotonArray, Profile, SurfaceBrightness};
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;

/// (f₁ ∗ f₂ ∗ …)(x), evaluated as the product of transforms.
#[derive(Debug, Clone)]
pub struct Convolution {
    children: Vec<Profile>,
    gsparams: GsParams,
    flux: f64,
    abs_flux: f64,
    centroid: Vector2<f64>,
    max_k: f64,
    step_k: f64,
    noise_variance: Option<f64>,
}

impl Convolution {
    /// Convolve one or more profiles, inheriting the first child's parameter set.
    pub fn new(items: impl IntoIterator<Item = Profile>) -> Result<Self> {
        Self::build(items, None)
    }

    pub fn with_gsparams(
        items: impl IntoIterator<Item = Profile>,
        gsparams: GsParams,
    ) -> Result<Self> {
        Self::build(items, Some(gsparams))
    }

    pub(crate) fn build(
        items: impl IntoIterator<Item = Profile>,
        gsparams: Option<GsParams>,
    ) -> Result<Self> {
        let mut children = Vec::new();
        for item in items {
            match item.as_convolution() {
                Some(conv) => children.extend(conv.children.iter().cloned()),
                None => children.push(item),
            }
        }
        let Some(first) = children.first() else {
            return Err(GalSimError::InvalidArgument(
                "a Convolution needs at least one profile".to_string(),
            ));
        };
        let gsparams = gsparams.unwrap_or_else(|| *first.gsparams());

        let mut noisy = children.iter().filter_map(|c| c.noise_variance());
        let noise_variance = noisy.next();
        if noisy.next().is_some() {
            warn!("convolving several noisy profiles; only the first noise variance is kept");
        }

        let inv_step_k_sq: f64 = children.iter().map(|c| c.step_k().powi(-2)).sum();
        Ok(Self {
            gsparams,
            flux: children.iter().map(|c| c.flux()).product(),
            abs_flux: children
                .iter()
                .map(|c| c.positive_flux() + c.negative_flux())
                .product(),
            centroid: children.iter().map(|c| c.centroid()).sum(),
            max_k: children
                .iter()
                .map(|c| c.max_k())
                .fold(f64::INFINITY, f64::min),
            step_k: inv_step_k_sq.sqrt().recip(),
            noise_variance,
            children,
        })
    }

    pub fn children(&self) -> &[Profile] {
        &self.children
    }
}

impl PartialEq for Convolution {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children && self.gsparams == other.gsparams
    }
}

impl Hash for Convolution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "Convolution".hash(state);
        self.children.hash(state);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for Convolution {
    fn flux(&self) -> f64 {
        self.flux
    }

    fn positive_flux(&self) -> f64 {
        0.5 * (self.abs_flux + self.flux)
    }

    fn negative_flux(&self) -> f64 {
        0.5 * (self.abs_flux - self.flux)
    }

    fn centroid(&self) -> Vector2<f64> {
        self.centroid
    }

    fn max_k(&self) -> f64 {
        self.max_k
    }

    fn step_k(&self) -> f64 {
        self.step_k
    }

    fn has_hard_edges(&self) -> bool {
        self.children.len() == 1 && self.children[0].has_hard_edges()
    }

    fn is_axisymmetric(&self) -> bool {
        self.children.iter().all(|c| c.is_axisymmetric())
    }

    fn is_analytic_x(&self) -> bool {
        self.children.len() == 1 && self.children[0].is_analytic_x()
    }

    fn is_analytic_k(&self) -> bool {
        self.children.iter().all(|c| c.is_analytic_k())
    }

    fn max_sb(&self) -> f64 {
        // Bounded by each child's peak spread over the others' total flux.
        (0..self.children.len())
            .map(|i| {
                let others: f64 = self
                    .children
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, c)| c.positive_flux() + c.negative_flux())
                    .product();
                self.children[i].max_sb() * others
            })
            .fold(f64::INFINITY, f64::min)
    }

    fn gsparams(&self) -> &GsParams {
        &self.gsparams
    }

    fn noise_variance(&self) -> Option<f64> {
        self.noise_variance
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        match self.children.as_slice() {
            [only] => only.x_value(pos),
            _ => Err(GalSimError::NotAnalyticReal("Convolution")),
        }
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        self.children.iter().map(|c| c.k_value(k)).product()
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        let mut total = Array2::from_elem((ky.len(), kx.len()), Complex64::new(1.0, 0.0));
        for child in &self.children {
            total *= &child.k_grid(kx, ky);
        }
        total
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let Some((first, rest)) = self.children.split_first() else {
            return Ok(PhotonArray::default());
        };
        let mut photons = first.shoot(n, rng)?;
        for child in rest {
            let other = child.shoot(n, rng)?;
            photons.convolve(&other, rng);
        }
        Ok(photons)
    }
}
