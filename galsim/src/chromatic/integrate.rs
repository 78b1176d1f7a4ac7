//! Quadrature over wavelength.
//!
//! Every integral has the form ∫ g(λ)·T(λ) dλ over a bandpass T. An
//! integrator reduces it to a weighted sum Σ wᵢ·T(λᵢ)·g(λᵢ) on a set of
//! nodes, where g is a scalar, a vector of scalars, or a whole image.
//!
//! - [`SampleIntegrator`] uses the trapezoid rule on the tabulation points of
//!   the SEDs and bandpass involved, plus the bandpass limits. It is exact
//!   for piecewise-linear integrands and is chosen automatically whenever
//!   any such points exist.
//! - [`ContinuousIntegrator`] lays a uniform grid over the bandpass for
//!   purely analytic integrands.

use log::{debug, warn};

use crate::error::{GalSimError, Result};
use crate::image_proc::Image;
use crate::photometry::Bandpass;

/// Default number of intervals for continuous quadrature
pub const DEFAULT_INTERVALS: usize = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IntegrationRule {
    /// N nodes at interval centres
    #[default]
    Midpoint,
    /// N+1 nodes including both limits
    Trapezoid,
    /// N+1 nodes, N rounded up to even
    Simpson,
}

/// Trapezoid rule on the merged wave list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleIntegrator;

/// Uniform-grid quadrature over the bandpass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuousIntegrator {
    pub rule: IntegrationRule,
    pub intervals: usize,
}

impl Default for ContinuousIntegrator {
    fn default() -> Self {
        Self {
            rule: IntegrationRule::default(),
            intervals: DEFAULT_INTERVALS,
        }
    }
}

impl ContinuousIntegrator {
    pub fn new(rule: IntegrationRule, intervals: usize) -> Self {
        Self { rule, intervals }
    }

    pub fn with_rule(mut self, rule: IntegrationRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_intervals(mut self, intervals: usize) -> Self {
        self.intervals = intervals;
        self
    }

    fn nodes(&self, blue: f64, red: f64) -> Vec<(f64, f64)> {
        let mut n = self.intervals.max(1);
        match self.rule {
            IntegrationRule::Midpoint => {
                let h = (red - blue) / n as f64;
                (0..n).map(|i| (blue + (i as f64 + 0.5) * h, h)).collect()
            }
            IntegrationRule::Trapezoid => {
                let h = (red - blue) / n as f64;
                (0..=n)
                    .map(|i| {
                        let w = if i == 0 || i == n { 0.5 * h } else { h };
                        (blue + i as f64 * h, w)
                    })
                    .collect()
            }
            IntegrationRule::Simpson => {
                if n % 2 == 1 {
                    n += 1;
                }
                let h = (red - blue) / n as f64;
                (0..=n)
                    .map(|i| {
                        let c = if i == 0 || i == n {
                            1.0
                        } else if i % 2 == 1 {
                            4.0
                        } else {
                            2.0
                        };
                        (blue + i as f64 * h, c * h / 3.0)
                    })
                    .collect()
            }
        }
    }
}

impl SampleIntegrator {
    fn nodes(&self, blue: f64, red: f64, wave_list: &[f64]) -> Result<Vec<(f64, f64)>> {
        if wave_list.is_empty() {
            return Err(GalSimError::InvalidArgument(
                "sampled integration needs a non-empty wave_list".to_string(),
            ));
        }
        let mut waves = Vec::with_capacity(wave_list.len() + 2);
        waves.push(blue);
        waves.extend(wave_list.iter().copied().filter(|&w| w > blue && w < red));
        waves.push(red);
        waves.sort_by(f64::total_cmp);
        waves.dedup();
        if waves.len() == 2 {
            warn!(
                "no wave_list samples inside [{blue}, {red}]; integrating on the limits alone"
            );
        }

        let mut nodes: Vec<(f64, f64)> = waves.iter().map(|&w| (w, 0.0)).collect();
        for i in 0..waves.len() - 1 {
            let half = 0.5 * (waves[i + 1] - waves[i]);
            nodes[i].1 += half;
            nodes[i + 1].1 += half;
        }
        Ok(nodes)
    }
}

/// How wavelength integrals are reduced to sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavelengthIntegrator {
    Sample(SampleIntegrator),
    Continuous(ContinuousIntegrator),
}

impl Default for WavelengthIntegrator {
    fn default() -> Self {
        WavelengthIntegrator::Continuous(ContinuousIntegrator::default())
    }
}

impl From<SampleIntegrator> for WavelengthIntegrator {
    fn from(value: SampleIntegrator) -> Self {
        WavelengthIntegrator::Sample(value)
    }
}

impl From<ContinuousIntegrator> for WavelengthIntegrator {
    fn from(value: ContinuousIntegrator) -> Self {
        WavelengthIntegrator::Continuous(value)
    }
}

impl WavelengthIntegrator {
    /// Sampled quadrature when `wave_list` has entries, continuous otherwise.
    pub fn select(wave_list: &[f64]) -> Self {
        if wave_list.is_empty() {
            Self::default()
        } else {
            WavelengthIntegrator::Sample(SampleIntegrator)
        }
    }

    /// Nodes and combined weights `(λᵢ, wᵢ·T(λᵢ))` for `bandpass`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a sampled integrator with an empty wave list.
    pub fn quadrature(&self, bandpass: &Bandpass, wave_list: &[f64]) -> Result<Vec<(f64, f64)>> {
        let (blue, red) = (bandpass.blue_limit(), bandpass.red_limit());
        let nodes = match self {
            WavelengthIntegrator::Sample(s) => s.nodes(blue, red, wave_list)?,
            WavelengthIntegrator::Continuous(c) => c.nodes(blue, red),
        };
        Ok(nodes
            .into_iter()
            .map(|(w, weight)| (w, weight * bandpass.at(w)))
            .collect())
    }

    /// Quadrature chosen by [`select`](Self::select), which cannot fail.
    pub(crate) fn auto_quadrature(bandpass: &Bandpass, wave_list: &[f64]) -> Vec<(f64, f64)> {
        let (blue, red) = (bandpass.blue_limit(), bandpass.red_limit());
        let nodes = match SampleIntegrator.nodes(blue, red, wave_list) {
            Ok(nodes) => nodes,
            Err(_) => ContinuousIntegrator::default().nodes(blue, red),
        };
        nodes
            .into_iter()
            .map(|(w, weight)| (w, weight * bandpass.at(w)))
            .collect()
    }

    /// Overwrite `out` with Σ wᵢ·T(λᵢ)·img(λᵢ), where `draw` renders the
    /// monochromatic image at λ into the buffer it is given. Returns the
    /// integrated flux on the image.
    pub fn integrate_image<F>(
        &self,
        bandpass: &Bandpass,
        wave_list: &[f64],
        out: &mut Image,
        mut draw: F,
    ) -> Result<f64>
    where
        F: FnMut(f64, &mut Image) -> Result<f64>,
    {
        let nodes = self.quadrature(bandpass, wave_list)?;
        debug!("integrating image over {} wavelengths", nodes.len());
        out.fill(0.0);
        let mut scratch = out.zeros_like();
        let mut total = 0.0;
        for (w, weight) in nodes {
            if weight == 0.0 {
                continue;
            }
            let flux = draw(w, &mut scratch)?;
            out.add_scaled(&scratch, weight);
            total += weight * flux;
        }
        Ok(total)
    }

    /// Σ wᵢ·T(λᵢ)·f(λᵢ)
    pub fn integrate_scalar<F>(&self, bandpass: &Bandpass, wave_list: &[f64], mut f: F) -> Result<f64>
    where
        F: FnMut(f64) -> Result<f64>,
    {
        let mut total = 0.0;
        for (w, weight) in self.quadrature(bandpass, wave_list)? {
            if weight != 0.0 {
                total += weight * f(w)?;
            }
        }
        Ok(total)
    }

    /// Like [`integrate_scalar`](Self::integrate_scalar) with a single call
    /// evaluating every node at once.
    pub fn integrate_vectorized<F>(&self, bandpass: &Bandpass, wave_list: &[f64], f: F) -> Result<f64>
    where
        F: FnOnce(&[f64]) -> Vec<f64>,
    {
        let (waves, weights): (Vec<f64>, Vec<f64>) =
            self.quadrature(bandpass, wave_list)?.into_iter().unzip();
        let values = f(&waves);
        if values.len() != waves.len() {
            return Err(GalSimError::InvalidArgument(format!(
                "vectorized integrand returned {} values for {} wavelengths",
                values.len(),
                waves.len()
            )));
        }
        Ok(weights.iter().zip(&values).map(|(w, v)| w * v).sum())
    }
}
