//! Fourier-space accuracy and size parameters shared by all profiles.
//!
//! A `GsParams` travels with every profile. Composites inherit the set of
//! their first child unless one is given explicitly. Parameter sets can be
//! loaded from JSON; keys that are not recognised are rejected rather than
//! silently ignored.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{GalSimError, Result};

/// Accuracy thresholds and FFT limits used when drawing profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GsParams {
    /// Smallest FFT allowed when drawing in Fourier space
    pub minimum_fft_size: usize,

    /// Largest FFT allowed; exceeding it is a render-time error
    pub maximum_fft_size: usize,

    /// Fraction of flux allowed to alias through the periodic FFT boundary
    pub folding_threshold: f64,

    /// Minimum real-space extent of a profile, in units of its half-light radius
    pub stepk_minimum_hlr: f64,

    /// Relative amplitude in k-space below which a profile is treated as zero
    pub maxk_threshold: f64,
}

impl Default for GsParams {
    fn default() -> Self {
        Self {
            minimum_fft_size: 128,
            maximum_fft_size: 8192,
            folding_threshold: 5.0e-3,
            stepk_minimum_hlr: 5.0,
            maxk_threshold: 1.0e-3,
        }
    }
}

impl GsParams {
    /// Parse a parameter set from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: GsParams = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                GalSimError::UnknownParameters(e.to_string())
            } else {
                GalSimError::InvalidArgument(format!("malformed parameter set: {e}"))
            }
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Check that every threshold is in range. FFT sizes are only compared
    /// against each other at draw time.
    pub fn validate(&self) -> Result<()> {
        if self.minimum_fft_size == 0 || self.maximum_fft_size == 0 {
            return Err(GalSimError::InvalidArgument(
                "FFT sizes must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("folding_threshold", self.folding_threshold),
            ("maxk_threshold", self.maxk_threshold),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(GalSimError::InvalidArgument(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if !(self.stepk_minimum_hlr >= 0.0) {
            return Err(GalSimError::InvalidArgument(format!(
                "stepk_minimum_hlr must be non-negative, got {}",
                self.stepk_minimum_hlr
            )));
        }
        Ok(())
    }
}

impl Hash for GsParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.minimum_fft_size.hash(state);
        self.maximum_fft_size.hash(state);
        self.folding_threshold.to_bits().hash(state);
        self.stepk_minimum_hlr.to_bits().hash(state);
        self.maxk_threshold.to_bits().hash(state);
    }
}
