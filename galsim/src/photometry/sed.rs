//! Spectral energy distributions.
//!
//! An [`Sed`] is a flux density per nanometre as a function of wavelength.
//! SEDs are immutable shared values: cloning is cheap, and two SEDs compare
//! equal when they are clones of one another or are built the same way from
//! equal parts. Chromatic sums rely on that identity to group terms that share
//! a spectrum.
//!
//! Besides evaluation, an SED knows how to integrate itself through a
//! [`Bandpass`] and how to predict the first two moments of the
//! differential-chromatic-refraction shift and the chromatic-seeing size
//! change it induces in a point source.

use std::fmt;
use std::ops::Mul;
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};
use once_cell::sync::Lazy;

use super::{merge_wave_lists, Bandpass};
use crate::algo::LookupTable;
use crate::atmosphere::refraction::{get_refraction, AtmosphericConditions};
use crate::chromatic::integrate::WavelengthIntegrator;
use crate::error::{GalSimError, Result};
use crate::units::{Angle, AngleExt};

type SpectralFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

static UNITY: Lazy<Sed> = Lazy::new(|| Sed::constant(1.0));

enum SedKind {
    Constant(f64),
    Function(SpectralFn),
    Table(LookupTable),
    Scaled { base: Sed, factor: f64 },
    Product(Sed, Sed),
    Weighted { base: Sed, weight: SpectralFn },
}

#[derive(Clone)]
pub struct Sed(Arc<SedKind>);

impl Sed {
    fn from_kind(kind: SedKind) -> Self {
        Sed(Arc::new(kind))
    }

    /// Flat spectrum of the given flux density.
    pub fn constant(value: f64) -> Self {
        Self::from_kind(SedKind::Constant(value))
    }

    /// The flat unit spectrum attached to achromatic profiles.
    pub fn unity() -> Self {
        UNITY.clone()
    }

    pub fn from_fn(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::from_kind(SedKind::Function(Arc::new(f)))
    }

    /// Tabulated spectrum, zero outside the table.
    pub fn from_table(table: LookupTable) -> Self {
        Self::from_kind(SedKind::Table(table))
    }

    pub fn from_samples(wavelengths: Vec<f64>, flux_densities: Vec<f64>) -> Result<Self> {
        Ok(Self::from_table(LookupTable::from_table(
            wavelengths,
            flux_densities,
        )?))
    }

    /// Flux density at `wavelength` (nm).
    pub fn at(&self, wavelength: f64) -> f64 {
        match &*self.0 {
            SedKind::Constant(v) => *v,
            SedKind::Function(f) => f(wavelength),
            SedKind::Table(table) => table.at(wavelength),
            SedKind::Scaled { base, factor } => factor * base.at(wavelength),
            SedKind::Product(a, b) => a.at(wavelength) * b.at(wavelength),
            SedKind::Weighted { base, weight } => weight(wavelength) * base.at(wavelength),
        }
    }

    pub fn values(&self, wavelengths: &[f64]) -> Vec<f64> {
        wavelengths.iter().map(|&w| self.at(w)).collect()
    }

    /// Wavelengths at which the spectrum is tabulated; empty for analytic spectra.
    pub fn wave_list(&self) -> Vec<f64> {
        match &*self.0 {
            SedKind::Constant(_) | SedKind::Function(_) => Vec::new(),
            SedKind::Table(table) => table.xs().to_vec(),
            SedKind::Scaled { base, .. } | SedKind::Weighted { base, .. } => base.wave_list(),
            SedKind::Product(a, b) => merge_wave_lists(&a.wave_list(), &b.wave_list()),
        }
    }

    /// Whether the spectrum is identically the unit constant.
    pub fn is_unity(&self) -> bool {
        matches!(&*self.0, SedKind::Constant(v) if *v == 1.0)
    }

    pub fn scaled(&self, factor: f64) -> Sed {
        match &*self.0 {
            SedKind::Constant(v) => Sed::constant(v * factor),
            SedKind::Scaled { base, factor: f } => Self::from_kind(SedKind::Scaled {
                base: base.clone(),
                factor: f * factor,
            }),
            _ => Self::from_kind(SedKind::Scaled {
                base: self.clone(),
                factor,
            }),
        }
    }

    pub fn product(&self, other: &Sed) -> Sed {
        if self.is_unity() {
            return other.clone();
        }
        if other.is_unity() {
            return self.clone();
        }
        Self::from_kind(SedKind::Product(self.clone(), other.clone()))
    }

    /// Multiply by an arbitrary dimensionless function of wavelength.
    pub fn weighted(&self, weight: Arc<dyn Fn(f64) -> f64 + Send + Sync>) -> Sed {
        Self::from_kind(SedKind::Weighted {
            base: self.clone(),
            weight,
        })
    }

    /// Rescale so the flux density at `wavelength` equals `target`.
    pub fn with_flux_density(&self, target: f64, wavelength: f64) -> Result<Sed> {
        let current = self.at(wavelength);
        if current == 0.0 {
            return Err(GalSimError::InvalidArgument(format!(
                "SED vanishes at {wavelength} nm and cannot be normalised there"
            )));
        }
        Ok(self.scaled(target / current))
    }

    /// Rescale so the flux through `bandpass` equals `target`.
    pub fn with_flux(&self, target: f64, bandpass: &Bandpass) -> Result<Sed> {
        let current = self.calculate_flux(bandpass);
        if current == 0.0 {
            return Err(GalSimError::InvalidArgument(
                "SED has no flux in the bandpass".to_string(),
            ));
        }
        Ok(self.scaled(target / current))
    }

    /// ∫ SED(λ)·T(λ) dλ over the bandpass.
    pub fn calculate_flux(&self, bandpass: &Bandpass) -> f64 {
        self.weighted_sums(bandpass, |_| 1.0).1
    }

    /// Mean and variance of the zenith-direction refraction, weighted by the
    /// photons this SED sends through `bandpass`.
    ///
    /// Returns the first moment as a vector (arcsec) and the second central
    /// moment as a matrix (arcsec²), both along the zenith direction
    /// (−sin q, cos q) for parallactic angle q.
    pub fn calculate_dcr_moment_shifts(
        &self,
        bandpass: &Bandpass,
        zenith_angle: Angle,
        parallactic_angle: Angle,
        conditions: &AtmosphericConditions,
    ) -> (Vector2<f64>, Matrix2<f64>) {
        let refraction = |w: f64| get_refraction(w, zenith_angle, conditions).as_arcseconds();
        let (sum_r, flux) = self.weighted_sums(bandpass, &refraction);
        let mean = sum_r / flux;
        let (sum_v, _) = self.weighted_sums(bandpass, |w| (refraction(w) - mean).powi(2));
        let variance = sum_v / flux;

        let (sin_q, cos_q) = parallactic_angle.as_radians().sin_cos();
        let direction = Vector2::new(-sin_q, cos_q);
        (direction * mean, direction * direction.transpose() * variance)
    }

    /// Ratio of the second moment of a PSF whose size scales as
    /// (λ/λ₀)^α, integrated over this SED and `bandpass`, to its size at λ₀.
    pub fn calculate_seeing_moment_ratio(
        &self,
        bandpass: &Bandpass,
        alpha: f64,
        base_wavelength: f64,
    ) -> f64 {
        let (sum, flux) =
            self.weighted_sums(bandpass, |w| (w / base_wavelength).powf(2.0 * alpha));
        sum / flux
    }

    /// (∫ g·SED·T, ∫ SED·T) on the quadrature nodes rendering would use.
    fn weighted_sums(&self, bandpass: &Bandpass, g: impl Fn(f64) -> f64) -> (f64, f64) {
        let wave_list = bandpass.integration_wave_list(&self.wave_list());
        WavelengthIntegrator::auto_quadrature(bandpass, &wave_list)
            .into_iter()
            .fold((0.0, 0.0), |(num, den), (w, weight)| {
                let photons = weight * self.at(w);
                (num + g(w) * photons, den + photons)
            })
    }
}

impl PartialEq for Sed {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (SedKind::Constant(a), SedKind::Constant(b)) => a == b,
            (SedKind::Function(a), SedKind::Function(b)) => Arc::ptr_eq(a, b),
            (SedKind::Table(a), SedKind::Table(b)) => a == b,
            (
                SedKind::Scaled { base: a, factor: fa },
                SedKind::Scaled { base: b, factor: fb },
            ) => fa == fb && a == b,
            (SedKind::Product(a1, a2), SedKind::Product(b1, b2)) => a1 == b1 && a2 == b2,
            (
                SedKind::Weighted { base: a, weight: wa },
                SedKind::Weighted { base: b, weight: wb },
            ) => Arc::ptr_eq(wa, wb) && a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Sed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            SedKind::Constant(v) => write!(f, "Sed::Constant({v})"),
            SedKind::Function(_) => write!(f, "Sed::Function"),
            SedKind::Table(table) => write!(
                f,
                "Sed::Table({} points on [{}, {}])",
                table.xs().len(),
                table.x_min(),
                table.x_max()
            ),
            SedKind::Scaled { base, factor } => write!(f, "{factor} * {base:?}"),
            SedKind::Product(a, b) => write!(f, "({a:?}) * ({b:?})"),
            SedKind::Weighted { base, .. } => write!(f, "Sed::Weighted({base:?})"),
        }
    }
}

impl Mul<f64> for Sed {
    type Output = Sed;

    fn mul(self, rhs: f64) -> Sed {
        self.scaled(rhs)
    }
}

impl Mul<Sed> for f64 {
    type Output = Sed;

    fn mul(self, rhs: Sed) -> Sed {
        rhs.scaled(self)
    }
}

impl Mul<Sed> for Sed {
    type Output = Sed;

    fn mul(self, rhs: Sed) -> Sed {
        self.product(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_sed() -> Sed {
        Sed::from_samples(vec![400.0, 600.0], vec![1.0, 3.0]).unwrap()
    }

    #[test]
    fn test_identity() {
        let a = linear_sed();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a, linear_sed());
        assert_eq!(Sed::unity(), Sed::unity());
        assert_eq!(a.scaled(2.0), a.scaled(2.0));
        assert_ne!(a.scaled(2.0), a);

        let f = Sed::from_fn(|w| w);
        assert_eq!(f, f.clone());
        assert_ne!(f, Sed::from_fn(|w| w));
    }

    #[test]
    fn test_repeated_scaling_collapses() {
        let a = linear_sed();
        assert_eq!(a.scaled(2.0).scaled(3.0), a.scaled(6.0));
        assert_relative_eq!((a.clone() * 2.0).at(500.0), 4.0);
        assert_relative_eq!((0.5 * a).at(500.0), 1.0);
    }

    #[test]
    fn test_unity_is_neutral_in_products() {
        let a = linear_sed();
        assert_eq!(a.product(&Sed::unity()), a);
        assert_eq!(Sed::unity() * a.clone(), a);
        let sq = a.clone() * a.clone();
        assert_relative_eq!(sq.at(500.0), 4.0);
    }

    #[test]
    fn test_wave_lists() {
        let a = linear_sed();
        let b = Sed::from_samples(vec![450.0, 500.0], vec![1.0, 1.0]).unwrap();
        assert_eq!(a.wave_list(), vec![400.0, 600.0]);
        assert_eq!((a * b).wave_list(), vec![400.0, 450.0, 500.0, 600.0]);
        assert!(Sed::from_fn(|w| w).wave_list().is_empty());
    }

    #[test]
    fn test_flux_through_top_hat() {
        let bp = Bandpass::top_hat(400.0, 600.0).unwrap();
        // trapezoid on a linear table is exact
        assert_relative_eq!(linear_sed().calculate_flux(&bp), 400.0, epsilon = 1e-10);
        let normalised = linear_sed().with_flux(1.0, &bp).unwrap();
        assert_relative_eq!(normalised.calculate_flux(&bp), 1.0, epsilon = 1e-12);
        let at_500 = linear_sed().with_flux_density(0.3, 500.0).unwrap();
        assert_relative_eq!(at_500.at(500.0), 0.3, epsilon = 1e-14);
        assert!(linear_sed().with_flux_density(1.0, 700.0).is_err());
    }

    #[test]
    fn test_flux_of_analytic_sed_uses_continuous_quadrature() {
        let bp = Bandpass::from_fn(|_| 1.0, 400.0, 600.0).unwrap();
        let sed = Sed::from_fn(|w| w * w);
        let expected = (600f64.powi(3) - 400f64.powi(3)) / 3.0;
        assert_relative_eq!(sed.calculate_flux(&bp), expected, max_relative = 1e-5);
    }

    #[test]
    fn test_flux_ignores_tabulation_outside_band() {
        let band = Bandpass::from_fn(
            |w| (std::f64::consts::PI * (w - 400.0) / 200.0).sin(),
            400.0,
            600.0,
        )
        .unwrap();
        let flat = Sed::from_samples(vec![300.0, 900.0], vec![1.0, 1.0]).unwrap();
        let exact = 400.0 / std::f64::consts::PI;
        assert_relative_eq!(flat.calculate_flux(&band), exact, max_relative = 1e-5);
        let normalised = flat.with_flux(2.0, &band).unwrap();
        assert_relative_eq!(normalised.at(500.0), 2.0 / exact, max_relative = 1e-5);
    }

    #[test]
    fn test_weighted() {
        let sed = linear_sed().weighted(Arc::new(|w| w / 500.0));
        assert_relative_eq!(sed.at(600.0), 3.6);
        assert_eq!(sed.wave_list(), vec![400.0, 600.0]);
    }

    #[test]
    fn test_dcr_moments_along_zenith_direction() {
        let bp = Bandpass::top_hat(400.0, 600.0).unwrap();
        let conditions = AtmosphericConditions::default();
        let zenith = Angle::from_degrees(30.0);
        let (mean, var) = linear_sed().calculate_dcr_moment_shifts(
            &bp,
            zenith,
            Angle::from_degrees(0.0),
            &conditions,
        );
        assert_relative_eq!(mean.x, 0.0, epsilon = 1e-14);
        let r_blue = get_refraction(400.0, zenith, &conditions).as_arcseconds();
        let r_red = get_refraction(600.0, zenith, &conditions).as_arcseconds();
        assert!(mean.y > r_red && mean.y < r_blue);
        assert!(var[(1, 1)] > 0.0);
        assert_relative_eq!(var[(0, 0)], 0.0, epsilon = 1e-14);

        let (rotated, rotated_var) = linear_sed().calculate_dcr_moment_shifts(
            &bp,
            zenith,
            Angle::from_degrees(90.0),
            &conditions,
        );
        assert_relative_eq!(rotated.x, -mean.y, epsilon = 1e-12);
        assert_relative_eq!(rotated_var[(0, 0)], var[(1, 1)], epsilon = 1e-12);
    }

    #[test]
    fn test_seeing_ratio() {
        let bp = Bandpass::top_hat(500.0, 500.0001).unwrap();
        let ratio = linear_sed().calculate_seeing_moment_ratio(&bp, -0.2, 500.0);
        assert_relative_eq!(ratio, 1.0, epsilon = 1e-6);
        let wide = Bandpass::top_hat(400.0, 600.0).unwrap();
        let blue_weighted = Sed::from_samples(vec![400.0, 600.0], vec![3.0, 1.0]).unwrap();
        let red_weighted = linear_sed();
        // α < 0: bluer light sees a larger PSF
        assert!(
            blue_weighted.calculate_seeing_moment_ratio(&wide, -0.2, 500.0)
                > red_weighted.calculate_seeing_moment_ratio(&wide, -0.2, 500.0)
        );
    }
}
