//! Real-space and Fourier-space image buffers.
//!
//! Arrays are indexed `[row, col]`, i.e. `[y, x]`. The world origin is the
//! geometric centre of the image: pixel `(row, col)` sits at
//! `((col − (nx−1)/2)·scale, (row − (ny−1)/2)·scale)` arcseconds, so an
//! odd-sized image has a pixel centred on the origin and an even-sized image
//! has a pixel corner there.

use nalgebra::Vector2;
use ndarray::Array2;
use rustfft::num_complex::Complex64;

use super::moments::ImageMoments;

/// Real-valued image with a uniform pixel scale (arcsec / pixel).
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Array2<f64>,
    scale: f64,
}

impl Image {
    /// Zero-filled image of `nx` columns by `ny` rows.
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive and finite.
    pub fn new(nx: usize, ny: usize, scale: f64) -> Self {
        Self::from_array(Array2::zeros((ny, nx)), scale)
    }

    /// Wrap an existing `[row, col]` array.
    ///
    /// # Panics
    /// Panics if `scale` is not strictly positive and finite.
    pub fn from_array(data: Array2<f64>, scale: f64) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "pixel scale must be positive, got {scale}"
        );
        Self { data, scale }
    }

    /// Zero-filled image with the same shape and scale.
    pub fn zeros_like(&self) -> Self {
        Self::new(self.nx(), self.ny(), self.scale)
    }

    pub fn nx(&self) -> usize {
        self.data.ncols()
    }

    pub fn ny(&self) -> usize {
        self.data.nrows()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn array_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// World position of the centre of pixel `(row, col)`.
    pub fn pixel_center(&self, row: usize, col: usize) -> Vector2<f64> {
        let cx = (self.nx() as f64 - 1.0) / 2.0;
        let cy = (self.ny() as f64 - 1.0) / 2.0;
        Vector2::new(
            (col as f64 - cx) * self.scale,
            (row as f64 - cy) * self.scale,
        )
    }

    /// World x coordinate of every column.
    pub fn x_coords(&self) -> Vec<f64> {
        let cx = (self.nx() as f64 - 1.0) / 2.0;
        (0..self.nx())
            .map(|c| (c as f64 - cx) * self.scale)
            .collect()
    }

    /// World y coordinate of every row.
    pub fn y_coords(&self) -> Vec<f64> {
        let cy = (self.ny() as f64 - 1.0) / 2.0;
        (0..self.ny())
            .map(|r| (r as f64 - cy) * self.scale)
            .collect()
    }

    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn same_shape(&self, other: &Image) -> bool {
        self.data.dim() == other.data.dim()
    }

    /// Accumulate `weight × other` into this image.
    ///
    /// # Panics
    /// Panics if the two images have different shapes.
    pub fn add_scaled(&mut self, other: &Image, weight: f64) {
        assert!(
            self.same_shape(other),
            "image shapes differ: {:?} vs {:?}",
            self.data.dim(),
            other.data.dim()
        );
        self.data.scaled_add(weight, &other.data);
    }

    /// Multiply every pixel by `factor`.
    pub fn scale_values(&mut self, factor: f64) {
        self.data.mapv_inplace(|v| v * factor);
    }

    /// Flux-weighted moments in world coordinates.
    pub fn moments(&self) -> ImageMoments {
        ImageMoments::measure(self)
    }
}

/// Complex Fourier-space image with uniform wavenumber spacing `dk` (rad / arcsec).
///
/// Entry `[row, col]` holds the transform at `kx = (col − nx/2)·dk`,
/// `ky = (row − ny/2)·dk`, so `k = 0` sits at `[ny/2, nx/2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KImage {
    data: Array2<Complex64>,
    dk: f64,
}

impl KImage {
    /// Zero-filled k-image.
    ///
    /// # Panics
    /// Panics if `dk` is not strictly positive and finite.
    pub fn new(nx: usize, ny: usize, dk: f64) -> Self {
        assert!(dk.is_finite() && dk > 0.0, "dk must be positive, got {dk}");
        Self {
            data: Array2::zeros((ny, nx)),
            dk,
        }
    }

    pub fn zeros_like(&self) -> Self {
        Self::new(self.nx(), self.ny(), self.dk)
    }

    pub fn nx(&self) -> usize {
        self.data.ncols()
    }

    pub fn ny(&self) -> usize {
        self.data.nrows()
    }

    pub fn dk(&self) -> f64 {
        self.dk
    }

    pub fn array(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn array_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.data
    }

    /// Wavenumbers of the columns and rows.
    pub fn wavenumbers(&self) -> (Vec<f64>, Vec<f64>) {
        let axis = |n: usize| -> Vec<f64> {
            let half = (n / 2) as f64;
            (0..n).map(|i| (i as f64 - half) * self.dk).collect()
        };
        (axis(self.nx()), axis(self.ny()))
    }

    /// Accumulate another k-image of identical shape.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn add(&mut self, other: &KImage) {
        assert_eq!(self.data.dim(), other.data.dim(), "k-image shapes differ");
        self.data += &other.data;
    }
}
