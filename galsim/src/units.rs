//! Type-safe physical units for atmospheric and angular quantities
//!
//! Angles, pressures and temperatures cross the public API as `uom`
//! quantities so that degrees, radians and arcseconds (or kPa and mmHg) cannot
//! be confused. Image-plane positions stay plain `f64` arcseconds and
//! wavelengths stay plain `f64` nanometres, matching how profiles and spectra
//! are evaluated in tight loops.

use uom::si::angle::{degree, radian, second};
use uom::si::f64::ThermodynamicTemperature;
use uom::si::pressure::kilopascal;
use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};

/// Type alias for temperature with convenient methods
pub type Temperature = ThermodynamicTemperature;

/// Type alias for pressure with convenient methods
pub type Pressure = uom::si::f64::Pressure;

/// Type alias for angles with convenient methods
pub type Angle = uom::si::f64::Angle;

/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 180.0 * 3600.0 / std::f64::consts::PI;

/// Extension trait for temperature conversions
pub trait TemperatureExt {
    /// Create temperature from degrees Celsius
    fn from_celsius(celsius: f64) -> Self;

    /// Get temperature in degrees Celsius
    fn as_celsius(&self) -> f64;

    /// Create temperature from Kelvin
    fn from_kelvin(kelvin: f64) -> Self;

    /// Get temperature in Kelvin
    fn as_kelvin(&self) -> f64;
}

/// Extension trait for pressure conversions used by refraction formulae
pub trait PressureExt {
    /// Create pressure from kilopascals
    fn from_kilopascals(kpa: f64) -> Self;

    /// Get pressure in kilopascals
    fn as_kilopascals(&self) -> f64;

    /// Get pressure in millimetres of mercury
    fn as_mmhg(&self) -> f64;
}

/// Extension trait for angle conversions
pub trait AngleExt {
    fn from_radians(rad: f64) -> Self;
    fn as_radians(&self) -> f64;
    fn from_degrees(deg: f64) -> Self;
    fn as_degrees(&self) -> f64;
    fn from_arcseconds(arcsec: f64) -> Self;
    fn as_arcseconds(&self) -> f64;
}

impl TemperatureExt for Temperature {
    fn from_celsius(celsius: f64) -> Self {
        Temperature::new::<degree_celsius>(celsius)
    }

    fn as_celsius(&self) -> f64 {
        self.get::<degree_celsius>()
    }

    fn from_kelvin(value: f64) -> Self {
        Temperature::new::<kelvin>(value)
    }

    fn as_kelvin(&self) -> f64 {
        self.get::<kelvin>()
    }
}

/// mmHg per kPa, as used by the Edlén refraction formula.
const MMHG_PER_KPA: f64 = 7.500_616_83;

impl PressureExt for Pressure {
    fn from_kilopascals(kpa: f64) -> Self {
        Pressure::new::<kilopascal>(kpa)
    }

    fn as_kilopascals(&self) -> f64 {
        self.get::<kilopascal>()
    }

    fn as_mmhg(&self) -> f64 {
        self.as_kilopascals() * MMHG_PER_KPA
    }
}

impl AngleExt for Angle {
    fn from_radians(rad: f64) -> Self {
        Angle::new::<radian>(rad)
    }

    fn as_radians(&self) -> f64 {
        self.get::<radian>()
    }

    fn from_degrees(deg: f64) -> Self {
        Angle::new::<degree>(deg)
    }

    fn as_degrees(&self) -> f64 {
        self.get::<degree>()
    }

    fn from_arcseconds(arcsec: f64) -> Self {
        Angle::new::<second>(arcsec)
    }

    fn as_arcseconds(&self) -> f64 {
        self.get::<second>()
    }
}
