//! One-dimensional interpolation kernels for sampled images.
//!
//! Each kernel K(x) is 1 at the origin, 0 at every other integer, and has
//! compact support `[-x_range, x_range]`. Its transform K̂(u) is expressed in
//! cycles per sample, K̂(u) = ∫ K(x) e^{−2πiux} dx.

use std::f64::consts::PI;

use super::pixel::sinc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolant {
    /// Tent kernel
    Linear,
    /// Keys cubic convolution kernel with a = −1/2
    Cubic,
    /// Piecewise-quintic kernel reproducing polynomials to fourth order
    #[default]
    Quintic,
}

impl Interpolant {
    /// Half-width of the kernel support, in samples.
    pub fn x_range(&self) -> f64 {
        match self {
            Interpolant::Linear => 1.0,
            Interpolant::Cubic => 2.0,
            Interpolant::Quintic => 3.0,
        }
    }

    pub fn x_value(&self, x: f64) -> f64 {
        let x = x.abs();
        if x >= self.x_range() {
            return 0.0;
        }
        match self {
            Interpolant::Linear => 1.0 - x,
            Interpolant::Cubic => {
                if x < 1.0 {
                    1.0 + x * x * (1.5 * x - 2.5)
                } else {
                    2.0 + x * (-4.0 + x * (2.5 - 0.5 * x))
                }
            }
            Interpolant::Quintic => {
                if x <= 1.0 {
                    1.0 + x * x * x * (-95.0 + x * (138.0 - 55.0 * x)) / 12.0
                } else if x <= 2.0 {
                    (x - 1.0) * (x - 2.0) * (-138.0 + x * (348.0 + x * (-249.0 + 55.0 * x)))
                        / 24.0
                } else {
                    (x - 2.0) * (x - 3.0) * (x - 3.0) * (-54.0 + x * (50.0 - 11.0 * x)) / 24.0
                }
            }
        }
    }

    /// Fourier transform of the kernel at `u` cycles per sample.
    pub fn u_value(&self, u: f64) -> f64 {
        let s = sinc(u);
        match self {
            Interpolant::Linear => s * s,
            Interpolant::Cubic => {
                let c = (PI * u).cos();
                s * s * s * (3.0 * s - 2.0 * c)
            }
            Interpolant::Quintic => {
                let c = (PI * u).cos();
                let pu2 = (PI * u) * (PI * u);
                s.powi(5) * (s * (55.0 - 19.0 * pu2) + 2.0 * c * (pu2 - 27.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Interpolant; 3] = [Interpolant::Linear, Interpolant::Cubic, Interpolant::Quintic];

    #[test]
    fn test_interpolates_integers() {
        for interp in ALL {
            assert_relative_eq!(interp.x_value(0.0), 1.0);
            for n in 1..4 {
                assert!(interp.x_value(n as f64).abs() < 1e-12, "{interp:?} at {n}");
                assert!(interp.x_value(-(n as f64)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_partition_of_unity() {
        for interp in ALL {
            for &x in &[0.1, 0.25, 0.5, 0.77] {
                let total: f64 = (-4..=4).map(|n| interp.x_value(x - n as f64)).sum();
                assert_relative_eq!(total, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_continuous_at_knots() {
        for interp in ALL {
            for knot in [1.0, 2.0] {
                let below = interp.x_value(knot - 1e-9);
                let above = interp.x_value(knot + 1e-9);
                assert!((below - above).abs() < 1e-7, "{interp:?} jumps at {knot}");
            }
        }
    }

    #[test]
    fn test_transform_matches_quadrature() {
        for interp in ALL {
            let n = 60_000;
            let range = interp.x_range();
            let dx = 2.0 * range / n as f64;
            for &u in &[0.0, 0.3, 0.5, 1.1] {
                let numeric: f64 = (0..n)
                    .map(|i| {
                        let x = -range + (i as f64 + 0.5) * dx;
                        interp.x_value(x) * (2.0 * PI * u * x).cos() * dx
                    })
                    .sum();
                assert_relative_eq!(interp.u_value(u), numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_default_is_quintic() {
        assert_eq!(Interpolant::default(), Interpolant::Quintic);
    }
}
