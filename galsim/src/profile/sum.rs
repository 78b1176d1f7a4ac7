//! Additive composite of monochromatic profiles.
//!
//! A `Sum` never contains another `Sum`: nested sums are spliced into the
//! child list at construction. Every derived quantity (flux, centroid,
//! bandwidth limits, capability flags, noise) is computed once when the node
//! is built and never recomputed.

use std::hash::{Hash, Hasher};

use nalgebra::Vector2;
use ndarray::Array2;
use rand::RngCore;
use rand_distr::{Binomial, Distribution};
use rustfft::num_complex::Complex64;

use super::{PhotonArray, Profile, SurfaceBrightness};
use crate::compose::Component;
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;
use crate::image_proc::{Image, KImage};

/// Σᵢ fᵢ(x) over an ordered, flattened list of children.
#[derive(Debug, Clone)]
pub struct Sum {
    children: Vec<Profile>,
    gsparams: GsParams,
    flux: f64,
    positive_flux: f64,
    negative_flux: f64,
    centroid: Vector2<f64>,
    max_k: f64,
    step_k: f64,
    hard_edges: bool,
    axisymmetric: bool,
    analytic_x: bool,
    analytic_k: bool,
    max_sb: f64,
    noise_variance: Option<f64>,
}

impl Sum {
    /// Sum of one or more profiles, inheriting the first child's parameter set.
    ///
    /// # Errors
    /// `InvalidArgument` if `items` is empty.
    pub fn new(items: impl IntoIterator<Item = Profile>) -> Result<Self> {
        Self::build(items, None)
    }

    /// Sum of one or more profiles with an explicit parameter set.
    pub fn with_gsparams(
        items: impl IntoIterator<Item = Profile>,
        gsparams: GsParams,
    ) -> Result<Self> {
        Self::build(items, Some(gsparams))
    }

    /// Sum of components that must all be monochromatic profiles.
    ///
    /// # Errors
    /// `TypeMismatch` if any component is chromatic; `InvalidArgument` if empty.
    pub fn from_components(items: impl IntoIterator<Item = Component>) -> Result<Self> {
        let profiles = items
            .into_iter()
            .map(|item| match item {
                Component::Profile(p) => Ok(p),
                Component::Chromatic(_) => Err(GalSimError::TypeMismatch {
                    expected: "Profile",
                    found: "ChromaticObject",
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(profiles)
    }

    fn build(items: impl IntoIterator<Item = Profile>, gsparams: Option<GsParams>) -> Result<Self> {
        let mut children = Vec::new();
        for item in items {
            match item.as_sum() {
                Some(sum) => children.extend(sum.children.iter().cloned()),
                None => children.push(item),
            }
        }
        let Some(first) = children.first() else {
            return Err(GalSimError::InvalidArgument(
                "a Sum needs at least one profile".to_string(),
            ));
        };
        let gsparams = gsparams.unwrap_or_else(|| *first.gsparams());

        let flux: f64 = children.iter().map(|c| c.flux()).sum();
        let weighted: Vector2<f64> = children.iter().map(|c| c.centroid() * c.flux()).sum();
        let centroid = if flux != 0.0 {
            weighted / flux
        } else {
            Vector2::zeros()
        };
        let noise_variance = children
            .iter()
            .filter_map(|c| c.noise_variance())
            .reduce(|a, b| a + b);

        Ok(Self {
            gsparams,
            flux,
            positive_flux: children.iter().map(|c| c.positive_flux()).sum(),
            negative_flux: children.iter().map(|c| c.negative_flux()).sum(),
            centroid,
            max_k: children.iter().map(|c| c.max_k()).fold(0.0, f64::max),
            step_k: children
                .iter()
                .map(|c| c.step_k())
                .fold(f64::INFINITY, f64::min),
            hard_edges: children.iter().any(|c| c.has_hard_edges()),
            axisymmetric: children.iter().all(|c| c.is_axisymmetric()),
            analytic_x: children.iter().all(|c| c.is_analytic_x()),
            analytic_k: children.iter().all(|c| c.is_analytic_k()),
            max_sb: children.iter().map(|c| c.max_sb()).sum(),
            noise_variance,
            children,
        })
    }

    pub fn children(&self) -> &[Profile] {
        &self.children
    }
}

impl From<Profile> for Sum {
    fn from(profile: Profile) -> Self {
        // A single child can never be empty
        match Sum::new([profile.clone()]) {
            Ok(sum) => sum,
            Err(_) => unreachable!("single-element sum"),
        }
    }
}

impl PartialEq for Sum {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children && self.gsparams == other.gsparams
    }
}

impl Hash for Sum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "Sum".hash(state);
        self.children.hash(state);
        self.gsparams.hash(state);
    }
}

impl SurfaceBrightness for Sum {
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
        self.step_k
    }

    fn has_hard_edges(&self) -> bool {
        self.hard_edges
    }

    fn is_axisymmetric(&self) -> bool {
        self.axisymmetric
    }

    fn is_analytic_x(&self) -> bool {
        self.analytic_x
    }

    fn is_analytic_k(&self) -> bool {
        self.analytic_k
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
        self.children.iter().map(|c| c.x_value(pos)).sum()
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        self.children.iter().map(|c| c.k_value(k)).sum()
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        let mut total = Array2::zeros((ky.len(), kx.len()));
        for child in &self.children {
            total += &child.k_grid(kx, ky);
        }
        total
    }

    fn draw_real(&self, image: &mut Image) -> Result<f64> {
        let (first, rest) = self
            .children
            .split_first()
            .ok_or_else(|| GalSimError::InvalidArgument("empty Sum".to_string()))?;
        let mut total = first.draw_real(image)?;
        if !rest.is_empty() {
            let mut scratch = image.zeros_like();
            for child in rest {
                total += child.draw_real(&mut scratch)?;
                image.add_scaled(&scratch, 1.0);
            }
        }
        Ok(total)
    }

    fn draw_k_image(&self, kimage: &mut KImage) {
        let Some((first, rest)) = self.children.split_first() else {
            return;
        };
        first.draw_k_image(kimage);
        if !rest.is_empty() {
            let mut scratch = kimage.zeros_like();
            for child in rest {
                child.draw_k_image(&mut scratch);
                kimage.add(&scratch);
            }
        }
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = PhotonArray::with_capacity(n);
        if n == 0 {
            return Ok(photons);
        }
        let total_abs = self.positive_flux + self.negative_flux;
        if !total_abs.is_finite() {
            return Err(GalSimError::InvalidArgument(format!(
                "cannot shoot photons from a sum with absolute flux {total_abs}"
            )));
        }
        let flux_per_photon = total_abs / n as f64;

        let mut remaining_n = n;
        let mut remaining_abs = total_abs;
        let last = self.children.len() - 1;
        for (i, child) in self.children.iter().enumerate() {
            let this_abs = child.positive_flux() + child.negative_flux();
            let this_n = if i == last {
                remaining_n
            } else if remaining_n == 0 || this_abs <= 0.0 {
                0
            } else {
                let p = if this_abs < remaining_abs {
                    this_abs / remaining_abs
                } else {
                    1.0
                };
                Binomial::new(remaining_n as u64, p)
                    .map_err(|e| {
                        GalSimError::InvalidArgument(format!(
                            "photon allocation probability {p}: {e}"
                        ))
                    })?
                    .sample(rng) as usize
            };

            if this_n > 0 {
                let mut child_photons = child.shoot(this_n, rng)?;
                if this_abs > 0.0 {
                    child_photons.scale_flux(flux_per_photon * this_n as f64 / this_abs);
                }
                photons.append(child_photons);
            }
            remaining_n -= this_n;
            remaining_abs -= this_abs;
        }

        debug_assert_eq!(remaining_n, 0, "photon allocation left photons unassigned");
        debug_assert!(
            remaining_abs.abs() <= 1.0e-8 * total_abs.max(1.0),
            "photon allocation left flux {remaining_abs} unassigned"
        );
        photons.set_correlated(self.children.len() > 1);
        Ok(photons)
    }
}
