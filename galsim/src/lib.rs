//! Chromatic surface-brightness composition and broadband rendering
//!
//! This crate models wavelength-dependent astronomical sources and PSFs and
//! renders them through a bandpass into a single image. Monochromatic
//! profiles (`profile`) are combined with spectra (`photometry`) into a
//! chromatic object graph (`chromatic`), which the renderer integrates over
//! wavelength, taking fast paths wherever the wavelength dependence factors
//! out of the shape.

pub mod algo;
pub mod atmosphere;
pub mod chromatic;
pub mod compose;
pub mod error;
pub mod gsparams;
pub mod image_proc;
pub mod photometry;
pub mod profile;
pub mod units;

// Re-exports for easier access
pub use atmosphere::celestial::CelestialCoord;
pub use atmosphere::refraction::{
    air_refractive_index_minus_one, get_refraction, zenith_parallactic_angles,
    AtmosphericConditions, ZenithSpec,
};
pub use chromatic::atmosphere::{chromatic_atmosphere, AtmosphereGeometry};
pub use chromatic::integrate::{
    ContinuousIntegrator, IntegrationRule, SampleIntegrator, WavelengthIntegrator,
};
pub use chromatic::render::ChromaticDrawOptions;
pub use chromatic::{
    ChromaticConvolution, ChromaticKind, ChromaticObject, ChromaticSum, ChromaticTransformation,
    WavelengthFn,
};
pub use compose::{add, convolve, Component, Composite};
pub use error::{GalSimError, Result};
pub use gsparams::GsParams;
pub use image_proc::{Image, ImageMoments, KImage};
pub use photometry::{Bandpass, Sed};
pub use profile::{
    DeltaFunction, Exponential, Gaussian, Interpolant, InterpolatedImage, PhotonArray, Pixel,
    Profile, Shear, Sum, SurfaceBrightness,
};
