//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use galsim::{Bandpass, ChromaticObject, Gaussian, Image, Pixel, Profile, Sed, Shear, WavelengthFn};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Smooth r-like filter sampled every 5 nm over 500-700 nm.
pub fn r_band() -> Bandpass {
    let waves: Vec<f64> = (0..=40).map(|i| 500.0 + 5.0 * i as f64).collect();
    let throughput = waves
        .iter()
        .map(|w| 0.15 + 0.85 * (-((w - 610.0) / 70.0).powi(2)).exp())
        .collect();
    Bandpass::from_samples(waves, throughput).expect("valid bandpass table")
}

fn tabulated_sed(f: impl Fn(f64) -> f64) -> Sed {
    let waves: Vec<f64> = (0..=40).map(|i| 400.0 + 10.0 * i as f64).collect();
    let values = waves.iter().map(|&w| f(w)).collect();
    Sed::from_samples(waves, values)
        .and_then(|sed| sed.with_flux_density(0.3, 500.0))
        .expect("valid sed table")
}

/// Red spectrum rising toward longer wavelengths.
pub fn bulge_sed() -> Sed {
    tabulated_sed(|w| (w / 500.0).powi(2))
}

/// Blue spectrum falling toward longer wavelengths.
pub fn disk_sed() -> Sed {
    tabulated_sed(|w| 500.0 / w)
}

pub fn bulge() -> ChromaticObject {
    Profile::from(Gaussian::from_half_light_radius(0.4)) * bulge_sed()
}

pub fn disk() -> ChromaticObject {
    let shear = Shear::new(0.2, -0.1).expect("valid shear");
    Profile::from(Gaussian::from_half_light_radius(0.8)).shear(shear) * disk_sed()
}

/// Gaussian seeing whose size scales as (λ/500)^-0.2.
pub fn seeing_psf(fwhm: f64) -> ChromaticObject {
    ChromaticObject::from(Profile::from(Gaussian::from_fwhm(fwhm)))
        .dilate(WavelengthFn::function(|w| (w / 500.0).powf(-0.2)))
}

pub fn pixel(scale: f64) -> ChromaticObject {
    Profile::from(Pixel::square(scale)).into()
}

pub fn max_abs_diff(a: &Image, b: &Image) -> f64 {
    a.array()
        .iter()
        .zip(b.array())
        .fold(0.0_f64, |m, (x, y)| m.max((x - y).abs()))
}

pub fn peak(image: &Image) -> f64 {
    image.array().iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}
