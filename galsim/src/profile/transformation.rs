//! Affine transformation of a profile: Jacobian, offset and flux ratio.

use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use nalgebra::{Matrix2, Vector2};
use ndarray::Array2;
use rand::RngCore;
use rustfft::num_complex::Complex64;

use super::{hash_f64s, PhotonArray, Profile, SurfaceBrightness};
use crate::error::Result;
use crate::gsparams::GsParams;

/// f'(x) = r / |det J| · f(J⁻¹(x − o)),  F'(k) = r · e^{−ik·o} · F(Jᵀk)
#[derive(Debug, Clone)]
pub struct Transformation {
    child: Profile,
    jac: Matrix2<f64>,
    offset: Vector2<f64>,
    flux_ratio: f64,
    inverse: Matrix2<f64>,
    abs_det: f64,
    sigma_min: f64,
    sigma_max: f64,
}

/// Singular values (min, max) of a 2×2 matrix.
fn singular_values(m: &Matrix2<f64>) -> (f64, f64) {
    let mtm = m.transpose() * m;
    let mean = 0.5 * (mtm[(0, 0)] + mtm[(1, 1)]);
    let half_diff = 0.5 * (mtm[(0, 0)] - mtm[(1, 1)]);
    let radius = (half_diff * half_diff + mtm[(0, 1)] * mtm[(0, 1)]).sqrt();
    ((mean - radius).max(0.0).sqrt(), (mean + radius).sqrt())
}

impl Transformation {
    /// Transform `child`, folding into an existing transformation rather than nesting.
    ///
    /// # Panics
    /// Panics if `jac` is singular.
    pub(crate) fn compose(
        child: &Profile,
        jac: Matrix2<f64>,
        offset: Vector2<f64>,
        flux_ratio: f64,
    ) -> Profile {
        let (inner, jac, offset, flux_ratio) = match child.as_transformation() {
            Some(t) => (
                t.child.clone(),
                jac * t.jac,
                jac * t.offset + offset,
                flux_ratio * t.flux_ratio,
            ),
            None => (child.clone(), jac, offset, flux_ratio),
        };
        if jac == Matrix2::identity() && offset == Vector2::zeros() && flux_ratio == 1.0 {
            return inner;
        }
        Profile::from(Self::new(inner, jac, offset, flux_ratio))
    }

    /// # Panics
    /// Panics if `jac` is singular.
    pub fn new(child: Profile, jac: Matrix2<f64>, offset: Vector2<f64>, flux_ratio: f64) -> Self {
        let det = jac.determinant();
        assert!(det != 0.0 && det.is_finite(), "transformation Jacobian is singular");
        // A non-singular 2×2 matrix always has an inverse
        let inverse = Matrix2::new(jac[(1, 1)], -jac[(0, 1)], -jac[(1, 0)], jac[(0, 0)]) / det;
        let (sigma_min, sigma_max) = singular_values(&jac);
        Self {
            child,
            jac,
            offset,
            flux_ratio,
            inverse,
            abs_det: det.abs(),
            sigma_min,
            sigma_max,
        }
    }

    pub fn child(&self) -> &Profile {
        &self.child
    }

    pub fn jacobian(&self) -> &Matrix2<f64> {
        &self.jac
    }

    pub fn offset(&self) -> &Vector2<f64> {
        &self.offset
    }

    pub fn flux_ratio(&self) -> f64 {
        self.flux_ratio
    }

    fn is_diagonal(&self) -> bool {
        self.jac[(0, 1)] == 0.0 && self.jac[(1, 0)] == 0.0
    }
}

impl PartialEq for Transformation {
    fn eq(&self, other: &Self) -> bool {
        self.child == other.child
            && self.jac == other.jac
            && self.offset == other.offset
            && self.flux_ratio == other.flux_ratio
    }
}

impl Hash for Transformation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        "Transformation".hash(state);
        self.child.hash(state);
        hash_f64s(state, self.jac.as_slice());
        hash_f64s(state, self.offset.as_slice());
        self.flux_ratio.to_bits().hash(state);
    }
}

impl SurfaceBrightness for Transformation {
    fn flux(&self) -> f64 {
        self.flux_ratio * self.child.flux()
    }

    fn positive_flux(&self) -> f64 {
        if self.flux_ratio >= 0.0 {
            self.flux_ratio * self.child.positive_flux()
        } else {
            -self.flux_ratio * self.child.negative_flux()
        }
    }

    fn negative_flux(&self) -> f64 {
        if self.flux_ratio >= 0.0 {
            self.flux_ratio * self.child.negative_flux()
        } else {
            -self.flux_ratio * self.child.positive_flux()
        }
    }

    fn centroid(&self) -> Vector2<f64> {
        self.jac * self.child.centroid() + self.offset
    }

    fn max_k(&self) -> f64 {
        self.child.max_k() / self.sigma_min
    }

    fn step_k(&self) -> f64 {
        let radius = PI / self.child.step_k() * self.sigma_max + self.offset.norm();
        PI / radius
    }

    fn has_hard_edges(&self) -> bool {
        self.child.has_hard_edges()
    }

    fn is_axisymmetric(&self) -> bool {
        let similarity = self.jac[(0, 0)] == self.jac[(1, 1)] && self.jac[(0, 1)] == -self.jac[(1, 0)];
        self.child.is_axisymmetric() && similarity && self.offset == Vector2::zeros()
    }

    fn is_analytic_x(&self) -> bool {
        self.child.is_analytic_x()
    }

    fn is_analytic_k(&self) -> bool {
        self.child.is_analytic_k()
    }

    fn max_sb(&self) -> f64 {
        self.flux_ratio.abs() / self.abs_det * self.child.max_sb()
    }

    fn gsparams(&self) -> &GsParams {
        self.child.gsparams()
    }

    fn noise_variance(&self) -> Option<f64> {
        self.child
            .noise_variance()
            .map(|v| v * self.flux_ratio * self.flux_ratio)
    }

    fn x_value(&self, pos: Vector2<f64>) -> Result<f64> {
        let source = self.inverse * (pos - self.offset);
        Ok(self.flux_ratio / self.abs_det * self.child.x_value(source)?)
    }

    fn k_value(&self, k: Vector2<f64>) -> Complex64 {
        let phase = Complex64::from_polar(self.flux_ratio, -k.dot(&self.offset));
        phase * self.child.k_value(self.jac.transpose() * k)
    }

    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        if !self.is_diagonal() {
            return Array2::from_shape_fn((ky.len(), kx.len()), |(r, c)| {
                self.k_value(Vector2::new(kx[c], ky[r]))
            });
        }
        // Jᵀk = (J₀₀ kx, J₁₁ ky): reuse the child's own grid evaluation
        let sx: Vec<f64> = kx.iter().map(|k| k * self.jac[(0, 0)]).collect();
        let sy: Vec<f64> = ky.iter().map(|k| k * self.jac[(1, 1)]).collect();
        let px: Vec<Complex64> = kx
            .iter()
            .map(|k| Complex64::from_polar(1.0, -k * self.offset.x))
            .collect();
        let py: Vec<Complex64> = ky
            .iter()
            .map(|k| Complex64::from_polar(self.flux_ratio, -k * self.offset.y))
            .collect();
        let mut grid = self.child.k_grid(&sx, &sy);
        for ((r, c), v) in grid.indexed_iter_mut() {
            *v *= px[c] * py[r];
        }
        grid
    }

    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray> {
        let mut photons = self.child.shoot(n, rng)?;
        photons.transform(&self.jac, &self.offset);
        photons.scale_flux(self.flux_ratio);
        Ok(photons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Gaussian, Pixel, Shear};
    use crate::units::{Angle, AngleExt};
    use approx::assert_relative_eq;

    #[test]
    fn test_nested_transforms_collapse() {
        let g: Profile = Gaussian::from_sigma(1.0).into();
        let t = g.dilate(2.0).shift(0.5, 0.0).rotate(Angle::from_degrees(90.0));
        let inner = t.as_transformation().unwrap();
        assert_eq!(inner.child(), &g);
        // The shift is rotated along with the profile
        assert_relative_eq!(t.centroid(), Vector2::new(0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_identity_returns_child() {
        let g: Profile = Gaussian::from_sigma(1.0).into();
        assert_eq!(g.shift(0.0, 0.0), g);
        assert!(g.shift(0.0, 0.0).as_transformation().is_none());
    }

    #[test]
    fn test_dilate_and_expand_flux() {
        let g: Profile = Gaussian::from_sigma(1.0).with_flux(2.0).into();
        assert_relative_eq!(g.dilate(3.0).flux(), 2.0);
        assert_relative_eq!(g.expand(3.0).flux(), 18.0);
        assert_relative_eq!(g.magnify(1.5).flux(), 3.0, epsilon = 1e-12);
        // Dilation by s is a Gaussian of width sσ
        let wide = Gaussian::from_sigma(3.0).with_flux(2.0);
        let p = Vector2::new(0.7, -1.1);
        assert_relative_eq!(
            g.dilate(3.0).x_value(p).unwrap(),
            wide.x_value(p).unwrap(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_x_and_k_consistency_under_shear() {
        let g: Profile = Gaussian::from_sigma(0.5).into();
        let sheared = g.shear(Shear::new(0.3, 0.1).unwrap()).shift(0.2, -0.3);
        // Flux is unchanged by an area-preserving shear
        assert_relative_eq!(sheared.k_value(Vector2::zeros()).re, 1.0, epsilon = 1e-14);
        assert_relative_eq!(sheared.centroid(), Vector2::new(0.2, -0.3), epsilon = 1e-14);
        let kimg = sheared.k_grid(&[0.0, 1.0], &[0.0, -2.0]);
        let direct = sheared.k_value(Vector2::new(1.0, -2.0));
        assert_relative_eq!(kimg[[1, 1]].re, direct.re, epsilon = 1e-14);
        assert_relative_eq!(kimg[[1, 1]].im, direct.im, epsilon = 1e-14);
    }

    #[test]
    fn test_diagonal_grid_matches_direct() {
        let p: Profile = Pixel::new(0.2, 0.4).into();
        let t = p.transform(Matrix2::new(2.0, 0.0, 0.0, 0.5), Vector2::new(0.1, 0.3), -1.5);
        let kx = [-4.0, 0.5, 3.0];
        let ky = [2.0, -7.0];
        let grid = t.k_grid(&kx, &ky);
        for (r, &y) in ky.iter().enumerate() {
            for (c, &x) in kx.iter().enumerate() {
                let direct = t.k_value(Vector2::new(x, y));
                assert_relative_eq!(grid[[r, c]].re, direct.re, epsilon = 1e-13);
                assert_relative_eq!(grid[[r, c]].im, direct.im, epsilon = 1e-13);
            }
        }
    }

    #[test]
    fn test_negative_flux_ratio_swaps_components() {
        let g: Profile = Gaussian::from_sigma(1.0).with_flux(2.0).into();
        let neg = g.with_scaled_flux(-0.5);
        assert_relative_eq!(neg.positive_flux(), 0.0);
        assert_relative_eq!(neg.negative_flux(), 1.0);
    }

    #[test]
    fn test_singular_values() {
        let (lo, hi) = singular_values(&Matrix2::new(3.0, 0.0, 0.0, -0.5));
        assert_relative_eq!(lo, 0.5, epsilon = 1e-14);
        assert_relative_eq!(hi, 3.0, epsilon = 1e-14);
    }
}
