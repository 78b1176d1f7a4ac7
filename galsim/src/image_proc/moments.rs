//! Flux-weighted image moments
//!
//! Raw moments are accumulated over every pixel and converted to central
//! second moments, all in world units (arcsec, arcsec²) relative to the
//! image centre.

use super::image::Image;

/// Flux, centroid and central second moments of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMoments {
    /// Sum of all pixel values
    pub flux: f64,
    /// Flux-weighted mean x (arcsec)
    pub x: f64,
    /// Flux-weighted mean y (arcsec)
    pub y: f64,
    /// Central second moment in x (arcsec²)
    pub m_xx: f64,
    /// Central second moment in y (arcsec²)
    pub m_yy: f64,
    /// Central cross moment (arcsec²)
    pub m_xy: f64,
}

impl ImageMoments {
    pub fn measure(image: &Image) -> Self {
        let xs = image.x_coords();
        let ys = image.y_coords();

        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;
        let mut m20 = 0.0;
        let mut m02 = 0.0;
        let mut m11 = 0.0;
        for ((row, col), &v) in image.array().indexed_iter() {
            let (x, y) = (xs[col], ys[row]);
            m00 += v;
            m10 += v * x;
            m01 += v * y;
            m20 += v * x * x;
            m02 += v * y * y;
            m11 += v * x * y;
        }

        if m00 == 0.0 {
            return Self {
                flux: 0.0,
                x: 0.0,
                y: 0.0,
                m_xx: 0.0,
                m_yy: 0.0,
                m_xy: 0.0,
            };
        }

        let x = m10 / m00;
        let y = m01 / m00;
        Self {
            flux: m00,
            x,
            y,
            m_xx: m20 / m00 - x * x,
            m_yy: m02 / m00 - y * y,
            m_xy: m11 / m00 - x * y,
        }
    }

    /// Trace of the second-moment matrix, m_xx + m_yy
    pub fn r_squared(&self) -> f64 {
        self.m_xx + self.m_yy
    }
}
