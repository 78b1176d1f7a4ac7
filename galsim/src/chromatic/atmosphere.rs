//! Ground-based atmospheric PSF with chromatic seeing and differential
//! chromatic refraction.

use nalgebra::Vector2;

use super::{ChromaticObject, WavelengthFn};
use crate::atmosphere::{
    get_refraction, zenith_parallactic_angles, AtmosphericConditions, CelestialCoord, ZenithSpec,
};
use crate::error::{GalSimError, Result};
use crate::profile::Profile;
use crate::units::{Angle, AngleExt};

/// Kolmogorov turbulence scales the seeing FWHM as λ^(−1/5).
pub const DEFAULT_SEEING_INDEX: f64 = -0.2;

/// How the pointing relative to the zenith is given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AtmosphereGeometry {
    ZenithAngle {
        zenith_angle: Angle,
        parallactic_angle: Angle,
    },
    /// Derive both angles from the object's position and the zenith.
    Coordinates {
        obj_coord: CelestialCoord,
        zenith: ZenithSpec,
    },
}

impl AtmosphereGeometry {
    /// Object at the zenith; no refraction.
    pub fn zenith() -> Self {
        AtmosphereGeometry::ZenithAngle {
            zenith_angle: Angle::from_radians(0.0),
            parallactic_angle: Angle::from_radians(0.0),
        }
    }

    fn angles(&self) -> Result<(Angle, Angle)> {
        match self {
            AtmosphereGeometry::ZenithAngle {
                zenith_angle,
                parallactic_angle,
            } => Ok((*zenith_angle, *parallactic_angle)),
            AtmosphereGeometry::Coordinates { obj_coord, zenith } => {
                zenith_parallactic_angles(obj_coord, zenith)
            }
        }
    }
}

/// `base` as seen at `base_wavelength` (nm), dilated by (λ/λ₀)^α and shifted
/// along the zenith direction by the refraction relative to λ₀.
///
/// The shift is in arcsec along (−sin q, cos q) for parallactic angle q.
///
/// # Errors
/// Returns `InvalidArgument` for a non-positive base wavelength or a zenith
/// angle outside [0°, 90°), and propagates failures to resolve the geometry.
pub fn chromatic_atmosphere(
    base: Profile,
    base_wavelength: f64,
    geometry: AtmosphereGeometry,
    alpha: f64,
    conditions: AtmosphericConditions,
) -> Result<ChromaticObject> {
    if !(base_wavelength > 0.0) {
        return Err(GalSimError::InvalidArgument(format!(
            "base wavelength must be positive, got {base_wavelength}"
        )));
    }
    let (zenith_angle, parallactic_angle) = geometry.angles()?;
    let z = zenith_angle.as_degrees();
    if !(0.0..90.0).contains(&z) {
        return Err(GalSimError::InvalidArgument(format!(
            "zenith angle must lie in [0, 90) degrees, got {z}"
        )));
    }

    let (sin_q, cos_q) = parallactic_angle.as_radians().sin_cos();
    let direction = Vector2::new(-sin_q, cos_q);
    let base_refraction = get_refraction(base_wavelength, zenith_angle, &conditions).as_arcseconds();

    let seeing = ChromaticObject::from(base)
        .dilate(WavelengthFn::function(move |w| (w / base_wavelength).powf(alpha)));
    Ok(seeing.shift(WavelengthFn::function(move |w| {
        let dr = get_refraction(w, zenith_angle, &conditions).as_arcseconds() - base_refraction;
        direction * dr
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Gaussian, SurfaceBrightness};
    use approx::assert_relative_eq;

    fn psf() -> Profile {
        Gaussian::from_fwhm(0.7).into()
    }

    fn geometry(zenith_deg: f64, parallactic_deg: f64) -> AtmosphereGeometry {
        AtmosphereGeometry::ZenithAngle {
            zenith_angle: Angle::from_degrees(zenith_deg),
            parallactic_angle: Angle::from_degrees(parallactic_deg),
        }
    }

    #[test]
    fn test_base_wavelength_is_unshifted() {
        let atm = chromatic_atmosphere(
            psf(),
            500.0,
            geometry(30.0, 10.0),
            DEFAULT_SEEING_INDEX,
            AtmosphericConditions::default(),
        )
        .unwrap();
        assert!(!atm.is_separable());
        let p = atm.evaluate_at_wavelength(500.0).unwrap();
        assert_relative_eq!(p.centroid().norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.max_k(), psf().max_k(), max_relative = 1e-12);
    }

    #[test]
    fn test_shift_follows_refraction() {
        let conditions = AtmosphericConditions::default();
        let atm =
            chromatic_atmosphere(psf(), 500.0, geometry(45.0, 0.0), 0.0, conditions).unwrap();
        let z = Angle::from_degrees(45.0);
        let expected = get_refraction(400.0, z, &conditions).as_arcseconds()
            - get_refraction(500.0, z, &conditions).as_arcseconds();
        let c = atm.evaluate_at_wavelength(400.0).unwrap().centroid();
        // parallactic angle 0 puts the zenith along +y
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, expected, max_relative = 1e-10);
        assert!(c.y > 0.0);
    }

    #[test]
    fn test_seeing_dilation() {
        let atm = chromatic_atmosphere(
            psf(),
            500.0,
            AtmosphereGeometry::zenith(),
            DEFAULT_SEEING_INDEX,
            AtmosphericConditions::default(),
        )
        .unwrap();
        let blue = atm.evaluate_at_wavelength(400.0).unwrap();
        assert_relative_eq!(
            blue.max_k(),
            psf().max_k() / (400.0_f64 / 500.0).powf(DEFAULT_SEEING_INDEX),
            max_relative = 1e-12
        );
        assert_relative_eq!(blue.flux(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let conditions = AtmosphericConditions::default();
        assert!(chromatic_atmosphere(psf(), 500.0, geometry(95.0, 0.0), 0.0, conditions).is_err());
        assert!(chromatic_atmosphere(psf(), -1.0, geometry(10.0, 0.0), 0.0, conditions).is_err());
        let missing = AtmosphereGeometry::Coordinates {
            obj_coord: CelestialCoord::new(Angle::from_degrees(10.0), Angle::from_degrees(-20.0)),
            zenith: ZenithSpec::default(),
        };
        assert!(chromatic_atmosphere(psf(), 500.0, missing, 0.0, conditions).is_err());
    }
}
