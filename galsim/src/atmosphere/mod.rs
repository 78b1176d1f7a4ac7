//! Atmospheric refraction and the sky geometry it depends on.

pub mod celestial;
pub mod refraction;

pub use celestial::CelestialCoord;
pub use refraction::{
    air_refractive_index_minus_one, get_refraction, zenith_parallactic_angles,
    AtmosphericConditions, ZenithSpec,
};
