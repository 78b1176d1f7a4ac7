//! Monochromatic surface-brightness profiles.
//!
//! A [`Profile`] is an immutable, cheaply clonable handle to one of a small
//! set of concrete profiles. Leaves are analytic kernels ([`Gaussian`],
//! [`Exponential`], [`Pixel`], [`DeltaFunction`]) or a sampled
//! [`InterpolatedImage`]; composites are [`Sum`], [`Convolution`] and
//! [`Transformation`]. Every variant implements [`SurfaceBrightness`], and
//! `Profile` dereferences to it, so
//!
//! ```rust
//! use galsim::{Gaussian, Pixel, Profile, SurfaceBrightness};
//! use galsim::profile::Convolution;
//!
//! let psf: Profile = Gaussian::from_fwhm(0.7).into();
//! let pixel: Profile = Pixel::square(0.2).into();
//! let star = Convolution::new(vec![psf.shift(0.1, 0.0), pixel]).unwrap();
//! assert!((star.flux() - 1.0).abs() < 1e-12);
//! ```
//!
//! # Conventions
//!
//! - Positions are arcseconds and wavenumbers radians per arcsecond.
//! - Fourier transforms use F(k) = ∫ f(x) e^{−ik·x} d²x, so F(0) is the flux.
//! - Drawing produces point samples of the surface brightness times the
//!   pixel area; a pixel response must be convolved in explicitly.

pub mod convolution;
pub mod delta;
mod draw;
pub mod exponential;
pub mod gaussian;
pub mod interpolant;
pub mod interpolated;
pub mod photons;
pub mod pixel;
pub mod shear;
pub mod sum;
pub mod transformation;

use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Mul};
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};
use ndarray::Array2;
use rand::RngCore;
use rustfft::num_complex::Complex64;

use crate::error::Result;
use crate::gsparams::GsParams;
use crate::image_proc::{Image, KImage};
use crate::units::{Angle, AngleExt};

pub use convolution::Convolution;
pub use delta::DeltaFunction;
pub use exponential::Exponential;
pub use gaussian::Gaussian;
pub use interpolant::Interpolant;
pub use interpolated::InterpolatedImage;
pub use photons::PhotonArray;
pub use pixel::Pixel;
pub use shear::Shear;
pub use sum::Sum;
pub use transformation::Transformation;

/// Stand-in for an unbounded `maxK` / `stepK`.
pub const MOCK_INF: f64 = 1.0e300;

/// The capability contract every monochromatic profile satisfies.
pub trait SurfaceBrightness: fmt::Debug + Send + Sync {
    /// Total (signed) flux
    fn flux(&self) -> f64;

    /// Flux carried by regions of positive surface brightness
    fn positive_flux(&self) -> f64 {
        self.flux().max(0.0)
    }

    /// Magnitude of the flux carried by regions of negative surface brightness
    fn negative_flux(&self) -> f64 {
        (-self.flux()).max(0.0)
    }

    /// Flux-weighted centre (arcsec)
    fn centroid(&self) -> Vector2<f64>;

    /// Wavenumber beyond which the transform is negligible
    fn max_k(&self) -> f64;

    /// Wavenumber spacing fine enough to avoid folding flux back into the image
    fn step_k(&self) -> f64;

    fn has_hard_edges(&self) -> bool;

    fn is_axisymmetric(&self) -> bool;

    /// Whether `x_value` is available
    fn is_analytic_x(&self) -> bool;

    /// Whether `k_value` is exact rather than approximate
    fn is_analytic_k(&self) -> bool;

    /// Maximum absolute surface brightness
    fn max_sb(&self) -> f64;

    fn gsparams(&self) -> &GsParams;

    /// Variance of any noise already present in the profile
    fn noise_variance(&self) -> Option<f64> {
        None
    }

    /// Surface brightness at a position.
    fn x_value(&self, pos: Vector2<f64>) -> Result<f64>;

    /// Fourier transform at a wavenumber.
    fn k_value(&self, k: Vector2<f64>) -> Complex64;

    /// Fourier transform on the grid `kx × ky`, indexed `[ky, kx]`.
    fn k_grid(&self, kx: &[f64], ky: &[f64]) -> Array2<Complex64> {
        Array2::from_shape_fn((ky.len(), kx.len()), |(r, c)| {
            self.k_value(Vector2::new(kx[c], ky[r]))
        })
    }

    /// Overwrite `image` with point samples times the pixel area, returning
    /// the flux placed on the image.
    fn draw_real(&self, image: &mut Image) -> Result<f64> {
        let xs = image.x_coords();
        let ys = image.y_coords();
        let area = image.scale() * image.scale();
        let mut total = 0.0;
        for ((row, col), pixel) in image.array_mut().indexed_iter_mut() {
            *pixel = self.x_value(Vector2::new(xs[col], ys[row]))? * area;
            total += *pixel;
        }
        Ok(total)
    }

    /// Overwrite `kimage` with the transform on its grid.
    fn draw_k_image(&self, kimage: &mut KImage) {
        let (kx, ky) = kimage.wavenumbers();
        *kimage.array_mut() = self.k_grid(&kx, &ky);
    }

    /// Shoot `n` photons whose fluxes sum (in expectation) to the profile flux.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when the flux cannot be split into photons.
    fn shoot(&self, n: usize, rng: &mut dyn RngCore) -> Result<PhotonArray>;
}

/// The concrete profile behind a [`Profile`] handle.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum ProfileKind {
    Gaussian(Gaussian),
    Exponential(Exponential),
    Pixel(Pixel),
    DeltaFunction(DeltaFunction),
    InterpolatedImage(InterpolatedImage),
    Sum(Sum),
    Convolution(Convolution),
    Transformation(Transformation),
}

impl ProfileKind {
    fn name(&self) -> &'static str {
        match self {
            ProfileKind::Gaussian(_) => "Gaussian",
            ProfileKind::Exponential(_) => "Exponential",
            ProfileKind::Pixel(_) => "Pixel",
            ProfileKind::DeltaFunction(_) => "DeltaFunction",
            ProfileKind::InterpolatedImage(_) => "InterpolatedImage",
            ProfileKind::Sum(_) => "Sum",
            ProfileKind::Convolution(_) => "Convolution",
            ProfileKind::Transformation(_) => "Transformation",
        }
    }
}

/// Shared, immutable handle to a monochromatic profile.
#[derive(Clone)]
pub struct Profile(Arc<ProfileKind>);

impl Profile {
    pub fn kind(&self) -> &ProfileKind {
        &self.0
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub(crate) fn as_sum(&self) -> Option<&Sum> {
        match &*self.0 {
            ProfileKind::Sum(sum) => Some(sum),
            _ => None,
        }
    }

    pub(crate) fn as_convolution(&self) -> Option<&Convolution> {
        match &*self.0 {
            ProfileKind::Convolution(conv) => Some(conv),
            _ => None,
        }
    }

    pub(crate) fn as_transformation(&self) -> Option<&Transformation> {
        match &*self.0 {
            ProfileKind::Transformation(t) => Some(t),
            _ => None,
        }
    }

    /// Pixel scale that samples this profile at its Nyquist rate.
    pub fn nyquist_scale(&self) -> f64 {
        PI / self.max_k()
    }

    /// Apply `f'(x) = r/|det J| · f(J⁻¹(x − offset))`.
    ///
    /// # Panics
    /// Panics if `jac` is singular.
    pub fn transform(&self, jac: Matrix2<f64>, offset: Vector2<f64>, flux_ratio: f64) -> Profile {
        Transformation::compose(self, jac, offset, flux_ratio)
    }

    pub fn with_scaled_flux(&self, ratio: f64) -> Profile {
        self.transform(Matrix2::identity(), Vector2::zeros(), ratio)
    }

    /// Rescale so the total flux becomes `flux`.
    ///
    /// A profile with zero flux is returned unchanged.
    pub fn with_flux(&self, flux: f64) -> Profile {
        let current = self.flux();
        if current == 0.0 {
            return self.clone();
        }
        self.with_scaled_flux(flux / current)
    }

    pub fn shear(&self, shear: Shear) -> Profile {
        self.transform(shear.jacobian(), Vector2::zeros(), 1.0)
    }

    /// Rotate counter-clockwise by `theta`.
    pub fn rotate(&self, theta: Angle) -> Profile {
        self.transform(rotation_matrix(theta), Vector2::zeros(), 1.0)
    }

    /// Scale linear size by `scale`, preserving flux.
    pub fn dilate(&self, scale: f64) -> Profile {
        self.transform(Matrix2::identity() * scale, Vector2::zeros(), 1.0)
    }

    /// Scale linear size by `scale`, preserving surface brightness.
    pub fn expand(&self, scale: f64) -> Profile {
        self.transform(Matrix2::identity() * scale, Vector2::zeros(), scale * scale)
    }

    /// Lensing magnification `mu`: area and flux both scale by `mu`.
    pub fn magnify(&self, mu: f64) -> Profile {
        self.expand(mu.sqrt())
    }

    /// Weak-lensing shear followed by magnification.
    pub fn lens(&self, g1: f64, g2: f64, mu: f64) -> Result<Profile> {
        let shear = Shear::new(g1, g2)?;
        Ok(self.transform(shear.jacobian() * mu.sqrt(), Vector2::zeros(), mu))
    }

    pub fn shift(&self, dx: f64, dy: f64) -> Profile {
        self.shift_by(Vector2::new(dx, dy))
    }

    pub fn shift_by(&self, offset: Vector2<f64>) -> Profile {
        self.transform(Matrix2::identity(), offset, 1.0)
    }

    fn surface(&self) -> &(dyn SurfaceBrightness + 'static) {
        match &*self.0 {
            ProfileKind::Gaussian(p) => p,
            ProfileKind::Exponential(p) => p,
            ProfileKind::Pixel(p) => p,
            ProfileKind::DeltaFunction(p) => p,
            ProfileKind::InterpolatedImage(p) => p,
            ProfileKind::Sum(p) => p,
            ProfileKind::Convolution(p) => p,
            ProfileKind::Transformation(p) => p,
        }
    }
}

/// Counter-clockwise rotation by `theta`.
pub(crate) fn rotation_matrix(theta: Angle) -> Matrix2<f64> {
    let (s, c) = theta.as_radians().sin_cos();
    Matrix2::new(c, -s, s, c)
}

impl Deref for Profile {
    type Target = dyn SurfaceBrightness;

    fn deref(&self) -> &Self::Target {
        self.surface()
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

macro_rules! impl_from_kind {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Profile {
                fn from(value: $ty) -> Self {
                    Profile(Arc::new(ProfileKind::$ty(value)))
                }
            }
        )*
    };
}

impl_from_kind!(
    Gaussian,
    Exponential,
    Pixel,
    DeltaFunction,
    InterpolatedImage,
    Sum,
    Convolution,
    Transformation
);

impl Mul<f64> for Profile {
    type Output = Profile;

    fn mul(self, rhs: f64) -> Profile {
        self.with_scaled_flux(rhs)
    }
}

impl Mul<Profile> for f64 {
    type Output = Profile;

    fn mul(self, rhs: Profile) -> Profile {
        rhs.with_scaled_flux(self)
    }
}

/// Feed a slice of floats into a hasher by bit pattern.
pub(crate) fn hash_f64s<H: Hasher>(state: &mut H, values: &[f64]) {
    for v in values {
        v.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(p: &Profile) -> u64 {
        let mut h = DefaultHasher::new();
        p.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_equality_is_structural() {
        let a: Profile = Gaussian::from_sigma(1.0).into();
        let b: Profile = Gaussian::from_sigma(1.0).into();
        let c: Profile = Gaussian::from_sigma(1.5).into();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_scalar_multiplication_commutes() {
        let g: Profile = Gaussian::from_sigma(1.0).with_flux(2.0).into();
        let left = 3.0 * g.clone();
        let right = g * 3.0;
        assert_relative_eq!(left.flux(), 6.0);
        assert_eq!(left, right);
    }

    #[test]
    fn test_with_flux() {
        let g: Profile = Exponential::from_scale_radius(0.5).into();
        assert_relative_eq!(g.with_flux(-4.0).flux(), -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nyquist_scale() {
        let g: Profile = Gaussian::from_sigma(2.0).into();
        assert_relative_eq!(g.nyquist_scale(), PI / g.max_k());
    }
}
