//! Refraction of starlight by the atmosphere.
//!
//! The refractive index of air follows Filippenko (1982), built on Edlén
//! (1953) and Coleman, Bozman & Meggers (1960). The empirical formula is
//! written for pressures in mmHg and temperatures in °C; callers supply typed
//! quantities and the conversion happens here.
//!
//! The default conditions are appropriate for a high, dry mountain site
//! (Cerro Pachón) and broadly reasonable elsewhere.

use crate::atmosphere::celestial::CelestialCoord;
use crate::error::{GalSimError, Result};
use crate::units::{Angle, AngleExt, Pressure, PressureExt, Temperature, TemperatureExt};

/// Default air pressure, kPa
pub const DEFAULT_PRESSURE_KPA: f64 = 69.328;

/// Default air temperature, K
pub const DEFAULT_TEMPERATURE_K: f64 = 293.15;

/// Default water vapour pressure, kPa
pub const DEFAULT_H2O_PRESSURE_KPA: f64 = 1.067;

/// Air pressure, temperature and water vapour pressure at the telescope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphericConditions {
    pub pressure: Pressure,
    pub temperature: Temperature,
    pub h2o_pressure: Pressure,
}

impl Default for AtmosphericConditions {
    fn default() -> Self {
        Self {
            pressure: Pressure::from_kilopascals(DEFAULT_PRESSURE_KPA),
            temperature: Temperature::from_kelvin(DEFAULT_TEMPERATURE_K),
            h2o_pressure: Pressure::from_kilopascals(DEFAULT_H2O_PRESSURE_KPA),
        }
    }
}

/// Refractive index of air minus one at `wavelength` (nm).
pub fn air_refractive_index_minus_one(wavelength: f64, conditions: &AtmosphericConditions) -> f64 {
    let p = conditions.pressure.as_mmhg();
    let t = conditions.temperature.as_celsius();
    let w = conditions.h2o_pressure.as_mmhg();

    // inverse wavelength squared, µm⁻²
    let sigma_sq = 1.0 / (wavelength * 1.0e-3).powi(2);
    let dry = (64.328 + 29498.1 / (146.0 - sigma_sq) + 255.4 / (41.0 - sigma_sq)) * 1.0e-6;
    let density = p * (1.0 + (1.049 - 0.0157 * t) * 1.0e-6 * p) / (720.883 * (1.0 + 0.003661 * t));
    let water = (0.0624 - 0.000680 * sigma_sq) / (1.0 + 0.003661 * t) * w * 1.0e-6;
    dry * density - water
}

pub fn air_refractive_index_minus_one_slice(
    wavelengths: &[f64],
    conditions: &AtmosphericConditions,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&w| air_refractive_index_minus_one(w, conditions))
        .collect()
}

/// Change in zenith angle for light of `wavelength` (nm) entering the atmosphere.
///
/// The apparent zenith angle is smaller than the true one; the returned
/// magnitude is positive.
pub fn get_refraction(
    wavelength: f64,
    zenith_angle: Angle,
    conditions: &AtmosphericConditions,
) -> Angle {
    let nm1 = air_refractive_index_minus_one(wavelength, conditions);
    // (n² − 1) / 2n² expanded in n − 1
    let r0 = nm1 * (nm1 + 2.0) / (2.0 * (nm1 * nm1 + 2.0 * nm1 + 1.0));
    Angle::from_radians(r0 * zenith_angle.as_radians().tan())
}

pub fn get_refraction_slice(
    wavelengths: &[f64],
    zenith_angle: Angle,
    conditions: &AtmosphericConditions,
) -> Vec<Angle> {
    wavelengths
        .iter()
        .map(|&w| get_refraction(w, zenith_angle, conditions))
        .collect()
}

/// Where the zenith is, either directly or via hour angle and latitude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZenithSpec {
    pub zenith_coord: Option<CelestialCoord>,
    pub hour_angle: Option<Angle>,
    pub latitude: Option<Angle>,
}

impl ZenithSpec {
    pub fn from_zenith(zenith_coord: CelestialCoord) -> Self {
        Self {
            zenith_coord: Some(zenith_coord),
            ..Self::default()
        }
    }

    /// Hour angle of the object and latitude of the observer.
    pub fn from_hour_angle(hour_angle: Angle, latitude: Angle) -> Self {
        Self {
            hour_angle: Some(hour_angle),
            latitude: Some(latitude),
            ..Self::default()
        }
    }
}

/// Zenith angle and parallactic angle of `obj`.
///
/// # Errors
/// Returns `InvalidArgument` unless `zenith` holds a zenith coordinate or both
/// an hour angle and a latitude.
pub fn zenith_parallactic_angles(obj: &CelestialCoord, zenith: &ZenithSpec) -> Result<(Angle, Angle)> {
    let zenith = match (zenith.zenith_coord, zenith.hour_angle, zenith.latitude) {
        (Some(zenith), _, _) => zenith,
        (None, Some(ha), Some(lat)) => CelestialCoord::new(ha + obj.ra(), lat),
        _ => {
            return Err(GalSimError::InvalidArgument(
                "need either a zenith coordinate or both hour angle and latitude".to_string(),
            ))
        }
    };
    let zenith_angle = obj.distance_to(&zenith);
    let parallactic_angle = obj.angle_between(&zenith, &CelestialCoord::north_pole());
    Ok((zenith_angle, parallactic_angle))
}
