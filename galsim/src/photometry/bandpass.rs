//! Filter throughput curves.

use std::fmt;
use std::sync::Arc;

use super::merge_wave_lists;
use crate::algo::LookupTable;
use crate::chromatic::integrate::WavelengthIntegrator;
use crate::error::{GalSimError, Result};

#[derive(Clone)]
enum Throughput {
    Function(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
    Table(LookupTable),
}

/// Dimensionless throughput between `blue_limit` and `red_limit` (nm), zero outside.
#[derive(Clone)]
pub struct Bandpass {
    throughput: Throughput,
    blue_limit: f64,
    red_limit: f64,
    wave_list: Vec<f64>,
}

fn check_limits(blue: f64, red: f64) -> Result<()> {
    if !(blue.is_finite() && red.is_finite() && blue > 0.0 && blue < red) {
        return Err(GalSimError::InvalidArgument(format!(
            "bandpass limits must satisfy 0 < blue < red, got [{blue}, {red}]"
        )));
    }
    Ok(())
}

impl Bandpass {
    /// Throughput given by `f` on `[blue, red]`.
    ///
    /// A function bandpass has no `wave_list`, so on its own it is integrated
    /// on a uniform grid.
    pub fn from_fn(
        f: impl Fn(f64) -> f64 + Send + Sync + 'static,
        blue: f64,
        red: f64,
    ) -> Result<Self> {
        check_limits(blue, red)?;
        Ok(Self {
            throughput: Throughput::Function(Arc::new(f)),
            blue_limit: blue,
            red_limit: red,
            wave_list: Vec::new(),
        })
    }

    /// Tabulated throughput. The limits are the ends of the table.
    pub fn from_table(table: LookupTable) -> Result<Self> {
        check_limits(table.x_min(), table.x_max())?;
        Ok(Self {
            blue_limit: table.x_min(),
            red_limit: table.x_max(),
            wave_list: table.xs().to_vec(),
            throughput: Throughput::Table(table),
        })
    }

    pub fn from_samples(wavelengths: Vec<f64>, throughputs: Vec<f64>) -> Result<Self> {
        Self::from_table(LookupTable::from_table(wavelengths, throughputs)?)
    }

    /// Unit throughput on `[blue, red]`.
    pub fn top_hat(blue: f64, red: f64) -> Result<Self> {
        Self::from_samples(vec![blue, red], vec![1.0, 1.0])
    }

    /// Throughput at `wavelength`.
    pub fn at(&self, wavelength: f64) -> f64 {
        if wavelength < self.blue_limit || wavelength > self.red_limit {
            return 0.0;
        }
        match &self.throughput {
            Throughput::Function(f) => f(wavelength),
            Throughput::Table(table) => table.at(wavelength),
        }
    }

    pub fn blue_limit(&self) -> f64 {
        self.blue_limit
    }

    pub fn red_limit(&self) -> f64 {
        self.red_limit
    }

    pub fn wave_list(&self) -> &[f64] {
        &self.wave_list
    }

    /// Union of `extra` and this bandpass's `wave_list`, clipped to the limits.
    ///
    /// An empty result means no tabulation point falls in the band, and the
    /// integrand is treated as analytic.
    pub(crate) fn integration_wave_list(&self, extra: &[f64]) -> Vec<f64> {
        merge_wave_lists(extra, &self.wave_list)
            .into_iter()
            .filter(|&w| w >= self.blue_limit && w <= self.red_limit)
            .collect()
    }

    /// Throughput-weighted mean wavelength, ∫λ·T(λ)dλ / ∫T(λ)dλ.
    pub fn effective_wavelength(&self) -> f64 {
        let nodes = WavelengthIntegrator::auto_quadrature(self, &self.wave_list);
        let (num, den) = nodes
            .iter()
            .fold((0.0, 0.0), |(num, den), &(w, weight)| (num + w * weight, den + weight));
        num / den
    }

    /// Narrow the passband to `[blue, red]`; `None` keeps the current limit.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the new limits are out of order or extend
    /// beyond the current ones.
    pub fn truncate(&self, blue: Option<f64>, red: Option<f64>) -> Result<Self> {
        let blue = blue.unwrap_or(self.blue_limit);
        let red = red.unwrap_or(self.red_limit);
        check_limits(blue, red)?;
        if blue < self.blue_limit || red > self.red_limit {
            return Err(GalSimError::InvalidArgument(format!(
                "cannot widen bandpass [{}, {}] to [{blue}, {red}]",
                self.blue_limit, self.red_limit
            )));
        }
        let mut wave_list: Vec<f64> = self
            .wave_list
            .iter()
            .copied()
            .filter(|&w| w > blue && w < red)
            .collect();
        if !self.wave_list.is_empty() {
            wave_list.insert(0, blue);
            wave_list.push(red);
        }
        Ok(Self {
            throughput: self.throughput.clone(),
            blue_limit: blue,
            red_limit: red,
            wave_list,
        })
    }
}

impl fmt::Debug for Bandpass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.throughput {
            Throughput::Function(_) => "function",
            Throughput::Table(_) => "table",
        };
        f.debug_struct("Bandpass")
            .field("kind", &kind)
            .field("blue_limit", &self.blue_limit)
            .field("red_limit", &self.red_limit)
            .field("wave_list_len", &self.wave_list.len())
            .finish()
    }
}
