//! Wavelength-dependent surface brightness.
//!
//! A [`ChromaticObject`] is an immutable node in a composition graph whose
//! leaves pair a monochromatic [`Profile`] with an [`Sed`]. Composites are
//! sums, convolutions, auto-convolutions, auto-correlations and
//! transformations whose parameters may themselves depend on wavelength via
//! [`WavelengthFn`].
//!
//! Each node caches whether it is *separable*, i.e. whether it factors into a
//! fixed shape times a spectrum. Separable nodes render with a single
//! monochromatic draw; see [`render`] for the other paths.
//!
//! ```rust
//! use galsim::{ChromaticObject, Gaussian, Profile, Sed, WavelengthFn};
//!
//! let psf: Profile = Gaussian::from_fwhm(0.7).into();
//! let star = ChromaticObject::from(psf.clone()) * Sed::from_fn(|w| w / 500.0);
//! assert!(star.is_separable());
//!
//! let seeing = ChromaticObject::from(psf).dilate(WavelengthFn::function(|w| (w / 500.0).powf(-0.2)));
//! assert!(!seeing.is_separable());
//! ```

pub mod atmosphere;
pub mod convolution;
pub mod integrate;
pub mod render;
pub mod sum;
pub mod transformation;

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};

use crate::error::Result;
use crate::gsparams::GsParams;
use crate::photometry::{merge_wave_lists, Sed};
use crate::profile::{rotation_matrix, Convolution, Profile, Shear, Sum};
use crate::units::{Angle, AngleExt};

pub use convolution::ChromaticConvolution;
pub use sum::ChromaticSum;
pub use transformation::ChromaticTransformation;

/// A parameter that is either fixed or a function of wavelength (nm).
pub enum WavelengthFn<T> {
    Constant(T),
    Function(Arc<dyn Fn(f64) -> T + Send + Sync>),
}

impl<T> WavelengthFn<T> {
    pub fn function(f: impl Fn(f64) -> T + Send + Sync + 'static) -> Self {
        WavelengthFn::Function(Arc::new(f))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, WavelengthFn::Constant(_))
    }
}

impl<T: Clone + Send + Sync + 'static> WavelengthFn<T> {
    pub fn at(&self, wavelength: f64) -> T {
        match self {
            WavelengthFn::Constant(v) => v.clone(),
            WavelengthFn::Function(f) => f(wavelength),
        }
    }

    /// Apply `f` to the value, keeping constants constant.
    pub fn map<U>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> WavelengthFn<U> {
        match self {
            WavelengthFn::Constant(v) => WavelengthFn::Constant(f(v.clone())),
            WavelengthFn::Function(g) => {
                let g = Arc::clone(g);
                WavelengthFn::function(move |w| f(g(w)))
            }
        }
    }

    /// Combine with another parameter pointwise.
    pub fn zip_with<U, V>(
        &self,
        other: &WavelengthFn<U>,
        f: impl Fn(T, U) -> V + Send + Sync + 'static,
    ) -> WavelengthFn<V>
    where
        U: Clone + Send + Sync + 'static,
    {
        match (self, other) {
            (WavelengthFn::Constant(a), WavelengthFn::Constant(b)) => {
                WavelengthFn::Constant(f(a.clone(), b.clone()))
            }
            _ => {
                let a = self.clone();
                let b = other.clone();
                WavelengthFn::function(move |w| f(a.at(w), b.at(w)))
            }
        }
    }
}

impl<T: Clone> Clone for WavelengthFn<T> {
    fn clone(&self) -> Self {
        match self {
            WavelengthFn::Constant(v) => WavelengthFn::Constant(v.clone()),
            WavelengthFn::Function(f) => WavelengthFn::Function(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for WavelengthFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WavelengthFn::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            WavelengthFn::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<T> From<T> for WavelengthFn<T> {
    fn from(value: T) -> Self {
        WavelengthFn::Constant(value)
    }
}

/// The concrete node behind a [`ChromaticObject`].
#[derive(Debug, Clone)]
pub enum ChromaticKind {
    /// A fixed shape times a spectrum
    Chromatic { profile: Profile, sed: Sed },
    Sum(ChromaticSum),
    Convolution(ChromaticConvolution),
    Transformation(ChromaticTransformation),
    AutoConvolution(ChromaticObject),
    AutoCorrelation(ChromaticObject),
}

struct Node {
    kind: ChromaticKind,
    separable: bool,
    wave_list: Vec<f64>,
}

/// Shared, immutable handle to a node of the chromatic composition graph.
#[derive(Clone)]
pub struct ChromaticObject(Arc<Node>);

impl ChromaticObject {
    /// A separable leaf: `profile` scaled by `sed(λ)`.
    pub fn new(profile: Profile, sed: Sed) -> Self {
        Self::from_kind(ChromaticKind::Chromatic { profile, sed })
    }

    pub(crate) fn from_kind(kind: ChromaticKind) -> Self {
        let (separable, wave_list) = match &kind {
            ChromaticKind::Chromatic { sed, .. } => (true, sed.wave_list()),
            ChromaticKind::Sum(sum) => (sum.is_separable(), union_wave_list(sum.terms())),
            ChromaticKind::Convolution(conv) => (
                conv.items().iter().all(|c| c.is_separable()),
                union_wave_list(conv.items()),
            ),
            ChromaticKind::Transformation(t) => (
                t.child().is_separable() && t.jacobian().is_constant() && t.offset().is_constant(),
                t.child().wave_list().to_vec(),
            ),
            ChromaticKind::AutoConvolution(child) | ChromaticKind::AutoCorrelation(child) => {
                (child.is_separable(), child.wave_list().to_vec())
            }
        };
        ChromaticObject(Arc::new(Node {
            kind,
            separable,
            wave_list,
        }))
    }

    pub fn kind(&self) -> &ChromaticKind {
        &self.0.kind
    }

    /// Whether the node is a wavelength-independent shape times a spectrum.
    pub fn is_separable(&self) -> bool {
        self.0.separable
    }

    /// Union of the tabulation points of every SED in the graph.
    pub fn wave_list(&self) -> &[f64] {
        &self.0.wave_list
    }

    pub fn ptr_eq(&self, other: &ChromaticObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn as_sum(&self) -> Option<&ChromaticSum> {
        match self.kind() {
            ChromaticKind::Sum(sum) => Some(sum),
            _ => None,
        }
    }

    pub(crate) fn as_convolution(&self) -> Option<&ChromaticConvolution> {
        match self.kind() {
            ChromaticKind::Convolution(conv) => Some(conv),
            _ => None,
        }
    }

    /// The fixed shape and spectrum of a separable node; `None` otherwise.
    pub fn separable_parts(&self) -> Option<(Profile, Sed)> {
        if !self.is_separable() {
            return None;
        }
        match self.kind() {
            ChromaticKind::Chromatic { profile, sed } => Some((profile.clone(), sed.clone())),
            ChromaticKind::Sum(sum) => {
                let mut shapes = Vec::with_capacity(sum.terms().len());
                let mut sed = None;
                for term in sum.terms() {
                    let (shape, term_sed) = term.separable_parts()?;
                    shapes.push(shape);
                    sed.get_or_insert(term_sed);
                }
                Some((Sum::new(shapes).ok()?.into(), sed?))
            }
            ChromaticKind::Convolution(conv) => {
                let mut shapes = Vec::with_capacity(conv.items().len());
                let mut sed = Sed::unity();
                for item in conv.items() {
                    let (shape, item_sed) = item.separable_parts()?;
                    shapes.push(shape);
                    sed = sed.product(&item_sed);
                }
                Some((Convolution::build(shapes, conv.gsparams()).ok()?.into(), sed))
            }
            ChromaticKind::Transformation(t) => {
                let (shape, sed) = t.child().separable_parts()?;
                let jac = t.jacobian().at(0.0);
                let offset = t.offset().at(0.0);
                match t.flux_ratio() {
                    WavelengthFn::Constant(r) => Some((shape.transform(jac, offset, *r), sed)),
                    WavelengthFn::Function(f) => {
                        Some((shape.transform(jac, offset, 1.0), sed.weighted(Arc::clone(f))))
                    }
                }
            }
            ChromaticKind::AutoConvolution(child) => {
                let (shape, sed) = child.separable_parts()?;
                let conv = Convolution::new([shape.clone(), shape]).ok()?;
                Some((conv.into(), sed.product(&sed)))
            }
            ChromaticKind::AutoCorrelation(child) => {
                let (shape, sed) = child.separable_parts()?;
                let flipped = shape.rotate(Angle::from_degrees(180.0));
                let conv = Convolution::new([shape, flipped]).ok()?;
                Some((conv.into(), sed.product(&sed)))
            }
        }
    }

    /// The monochromatic profile this node describes at `wavelength` (nm).
    ///
    /// # Panics
    /// Panics if a wavelength-dependent Jacobian is singular at `wavelength`.
    pub fn evaluate_at_wavelength(&self, wavelength: f64) -> Result<Profile> {
        match self.kind() {
            ChromaticKind::Chromatic { profile, sed } => {
                Ok(profile.with_scaled_flux(sed.at(wavelength)))
            }
            ChromaticKind::Sum(sum) => {
                let profiles = sum
                    .objlist()
                    .iter()
                    .map(|c| c.evaluate_at_wavelength(wavelength))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Sum::new(profiles)?.into())
            }
            ChromaticKind::Convolution(conv) => {
                let profiles = conv
                    .items()
                    .iter()
                    .map(|c| c.evaluate_at_wavelength(wavelength))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Convolution::build(profiles, conv.gsparams())?.into())
            }
            ChromaticKind::Transformation(t) => {
                let child = t.child().evaluate_at_wavelength(wavelength)?;
                Ok(child.transform(
                    t.jacobian().at(wavelength),
                    t.offset().at(wavelength),
                    t.flux_ratio().at(wavelength),
                ))
            }
            ChromaticKind::AutoConvolution(child) => {
                let p = child.evaluate_at_wavelength(wavelength)?;
                Ok(Convolution::new([p.clone(), p])?.into())
            }
            ChromaticKind::AutoCorrelation(child) => {
                let p = child.evaluate_at_wavelength(wavelength)?;
                let flipped = p.rotate(Angle::from_degrees(180.0));
                Ok(Convolution::new([p, flipped])?.into())
            }
        }
    }

    /// Sum of one or more chromatic objects, grouped by SED.
    pub fn sum(items: impl IntoIterator<Item = ChromaticObject>) -> Result<ChromaticObject> {
        Ok(ChromaticSum::new(items)?.into())
    }

    /// Convolution of one or more chromatic objects; see [`ChromaticConvolution::new`].
    pub fn convolve(
        items: impl IntoIterator<Item = ChromaticObject>,
        gsparams: Option<GsParams>,
    ) -> Result<ChromaticObject> {
        ChromaticConvolution::new(items, gsparams)
    }

    pub fn auto_convolve(&self) -> ChromaticObject {
        Self::from_kind(ChromaticKind::AutoConvolution(self.clone()))
    }

    /// `self ∗ self.rotate(180°)`
    pub fn auto_correlate(&self) -> ChromaticObject {
        Self::from_kind(ChromaticKind::AutoCorrelation(self.clone()))
    }

    /// Apply `f'(x) = r/|det J| · f(J⁻¹(x − o))` with parameters that may vary
    /// with wavelength.
    pub fn transform(
        &self,
        jac: WavelengthFn<Matrix2<f64>>,
        offset: WavelengthFn<Vector2<f64>>,
        flux_ratio: WavelengthFn<f64>,
    ) -> ChromaticObject {
        ChromaticTransformation::apply(self, jac, offset, flux_ratio)
    }

    pub fn scale_flux(&self, ratio: impl Into<WavelengthFn<f64>>) -> ChromaticObject {
        self.transform(
            WavelengthFn::Constant(Matrix2::identity()),
            WavelengthFn::Constant(Vector2::zeros()),
            ratio.into(),
        )
    }

    /// Multiply the spectrum by `sed`.
    pub fn with_sed(&self, sed: &Sed) -> ChromaticObject {
        match self.kind() {
            ChromaticKind::Chromatic { profile, sed: own } => {
                ChromaticObject::new(profile.clone(), own.product(sed))
            }
            _ => {
                let sed = sed.clone();
                self.scale_flux(WavelengthFn::function(move |w| sed.at(w)))
            }
        }
    }

    pub fn shear(&self, shear: impl Into<WavelengthFn<Shear>>) -> ChromaticObject {
        self.transform(
            shear.into().map(|s| s.jacobian()),
            WavelengthFn::Constant(Vector2::zeros()),
            WavelengthFn::Constant(1.0),
        )
    }

    /// Rotate counter-clockwise.
    pub fn rotate(&self, theta: impl Into<WavelengthFn<Angle>>) -> ChromaticObject {
        self.transform(
            theta.into().map(rotation_matrix),
            WavelengthFn::Constant(Vector2::zeros()),
            WavelengthFn::Constant(1.0),
        )
    }

    /// Scale linear size, preserving flux.
    pub fn dilate(&self, scale: impl Into<WavelengthFn<f64>>) -> ChromaticObject {
        self.transform(
            scale.into().map(|s| Matrix2::identity() * s),
            WavelengthFn::Constant(Vector2::zeros()),
            WavelengthFn::Constant(1.0),
        )
    }

    /// Scale linear size, preserving surface brightness.
    pub fn expand(&self, scale: impl Into<WavelengthFn<f64>>) -> ChromaticObject {
        let scale = scale.into();
        self.transform(
            scale.map(|s| Matrix2::identity() * s),
            WavelengthFn::Constant(Vector2::zeros()),
            scale.map(|s| s * s),
        )
    }

    /// Lensing magnification: area and flux both scale by `mu`.
    pub fn magnify(&self, mu: impl Into<WavelengthFn<f64>>) -> ChromaticObject {
        self.expand(mu.into().map(f64::sqrt))
    }

    /// Weak-lensing shear followed by magnification.
    pub fn lens(
        &self,
        shear: impl Into<WavelengthFn<Shear>>,
        mu: impl Into<WavelengthFn<f64>>,
    ) -> ChromaticObject {
        let mu = mu.into();
        self.transform(
            shear.into().zip_with(&mu, |s, m| s.jacobian() * m.sqrt()),
            WavelengthFn::Constant(Vector2::zeros()),
            mu,
        )
    }

    /// Shift the centre by `offset` (arcsec).
    pub fn shift(&self, offset: impl Into<WavelengthFn<Vector2<f64>>>) -> ChromaticObject {
        self.transform(
            WavelengthFn::Constant(Matrix2::identity()),
            offset.into(),
            WavelengthFn::Constant(1.0),
        )
    }
}

fn union_wave_list(items: &[ChromaticObject]) -> Vec<f64> {
    items
        .iter()
        .fold(Vec::new(), |acc, item| merge_wave_lists(&acc, item.wave_list()))
}

impl From<Profile> for ChromaticObject {
    /// An achromatic profile, carrying the unity SED.
    fn from(profile: Profile) -> Self {
        ChromaticObject::new(profile, Sed::unity())
    }
}

impl fmt::Debug for ChromaticObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromaticObject")
            .field("kind", &self.0.kind)
            .field("separable", &self.0.separable)
            .finish()
    }
}

impl Mul<Sed> for Profile {
    type Output = ChromaticObject;

    fn mul(self, rhs: Sed) -> ChromaticObject {
        ChromaticObject::new(self, rhs)
    }
}

impl Mul<Sed> for ChromaticObject {
    type Output = ChromaticObject;

    fn mul(self, rhs: Sed) -> ChromaticObject {
        self.with_sed(&rhs)
    }
}

impl Mul<f64> for ChromaticObject {
    type Output = ChromaticObject;

    fn mul(self, rhs: f64) -> ChromaticObject {
        self.scale_flux(rhs)
    }
}

impl Mul<ChromaticObject> for f64 {
    type Output = ChromaticObject;

    fn mul(self, rhs: ChromaticObject) -> ChromaticObject {
        rhs.scale_flux(self)
    }
}
