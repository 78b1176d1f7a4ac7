//! Spectra and filter throughputs.
//!
//! Wavelengths are nanometres throughout. Both [`Sed`] and [`Bandpass`] are
//! callable on a wavelength and may carry a `wave_list`: the tabulation
//! points at which they are known exactly. When any component of a render
//! carries a `wave_list`, integration over wavelength samples at those points
//! instead of on a uniform grid.

pub mod bandpass;
pub mod sed;

pub use bandpass::Bandpass;
pub use sed::Sed;

/// Sorted union of two wave lists with duplicates removed.
pub(crate) fn merge_wave_lists(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut merged: Vec<f64> = a.iter().chain(b).copied().collect();
    merged.sort_by(f64::total_cmp);
    merged.dedup();
    merged
}
