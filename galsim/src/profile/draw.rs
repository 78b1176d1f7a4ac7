//! Rendering monochromatic profiles into images.

use std::f64::consts::PI;

use log::debug;
use ndarray::Array2;
use rand::RngCore;
use rustfft::num_complex::Complex64;

use super::Profile;
use crate::algo::{good_fft_size, inverse_fft_2d};
use crate::error::{GalSimError, Result};
use crate::image_proc::Image;

impl Profile {
    /// Render into `image`, in real space when the profile allows it and by
    /// FFT otherwise. Returns the flux placed on the image.
    ///
    /// With `add_to_image` the rendering is added to the existing pixels;
    /// otherwise they are overwritten.
    pub fn draw_image(&self, image: &mut Image, add_to_image: bool) -> Result<f64> {
        if add_to_image {
            let mut scratch = image.zeros_like();
            let flux = self.render(&mut scratch)?;
            image.add_scaled(&scratch, 1.0);
            return Ok(flux);
        }
        self.render(image)
    }

    /// Render into a new image sized to hold the profile without folding.
    ///
    /// `scale` defaults to the Nyquist scale.
    pub fn draw_new_image(&self, scale: Option<f64>) -> Result<Image> {
        let scale = scale.unwrap_or_else(|| self.nyquist_scale());
        let n = good_fft_size((2.0 * PI / (self.step_k() * scale)).ceil() as usize);
        let mut image = Image::new(n, n, scale);
        self.draw_image(&mut image, false)?;
        Ok(image)
    }

    /// Bin `n` shot photons into `image`, returning the flux that landed on it.
    pub fn draw_photons(
        &self,
        image: &mut Image,
        n: usize,
        rng: &mut dyn RngCore,
        add_to_image: bool,
    ) -> Result<f64> {
        let photons = self.shoot(n, rng)?;
        if !add_to_image {
            image.fill(0.0);
        }
        Ok(photons.add_to_image(image))
    }

    fn render(&self, image: &mut Image) -> Result<f64> {
        if self.is_analytic_x() {
            self.draw_real(image)
        } else {
            self.draw_fft(image)
        }
    }

    /// Overwrite `image` by sampling the transform on a folded grid.
    pub(crate) fn draw_fft(&self, image: &mut Image) -> Result<f64> {
        let gsparams = self.gsparams();
        let scale = image.scale();
        let (nx, ny) = (image.nx(), image.ny());

        let wrap_size = (2.0 * PI / (self.step_k() * scale)).ceil().min(usize::MAX as f64) as usize;
        let n = good_fft_size(nx.max(ny).max(wrap_size).max(gsparams.minimum_fft_size));
        if n > gsparams.maximum_fft_size {
            return Err(GalSimError::FftTooLarge {
                required: n,
                maximum: gsparams.maximum_fft_size,
            });
        }

        let dk = 2.0 * PI / (n as f64 * scale);
        let k_max = self.max_k().max(PI / scale);
        let half = (k_max / dk - 1.0e-9).ceil().max((n / 2) as f64);
        if 2.0 * half > gsparams.maximum_fft_size as f64 {
            return Err(GalSimError::FftTooLarge {
                required: (2.0 * half).min(usize::MAX as f64) as usize,
                maximum: gsparams.maximum_fft_size,
            });
        }
        let half = half as i64;
        debug!(
            "FFT draw of {}: grid {n}, {} k samples per axis",
            self.name(),
            2 * half
        );

        let ks: Vec<f64> = (-half..half).map(|m| m as f64 * dk).collect();
        let grid = self.k_grid(&ks, &ks);

        // Even-sized images have a pixel corner, not a centre, at the origin.
        let shift_x = if nx % 2 == 0 { 0.5 * scale } else { 0.0 };
        let shift_y = if ny % 2 == 0 { 0.5 * scale } else { 0.0 };

        let size = n as i64;
        let mut folded = Array2::<Complex64>::zeros((n, n));
        for ((r, c), value) in grid.indexed_iter() {
            let (ky, kx) = (ks[r], ks[c]);
            let phase = Complex64::from_polar(1.0, kx * shift_x + ky * shift_y);
            let row = (r as i64 - half).rem_euclid(size) as usize;
            let col = (c as i64 - half).rem_euclid(size) as usize;
            folded[[row, col]] += value * phase;
        }
        inverse_fft_2d(&mut folded);

        let norm = 1.0 / (n as f64 * n as f64);
        let mut total = 0.0;
        for ((row, col), pixel) in image.array_mut().indexed_iter_mut() {
            let j = (row as i64 - (ny / 2) as i64).rem_euclid(size) as usize;
            let i = (col as i64 - (nx / 2) as i64).rem_euclid(size) as usize;
            *pixel = folded[[j, i]].re * norm;
            total += *pixel;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsparams::GsParams;
    use crate::profile::{Convolution, DeltaFunction, Gaussian, Pixel, SurfaceBrightness};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn peak(image: &Image) -> f64 {
        image.array().iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    #[test]
    fn test_fft_matches_real_space() {
        for (nx, ny) in [(32, 32), (33, 31), (40, 27)] {
            let g: Profile = Profile::from(Gaussian::from_sigma(0.4).with_flux(3.0)).shift(0.05, -0.1);
            let mut real = Image::new(nx, ny, 0.1);
            let mut fft = Image::new(nx, ny, 0.1);
            g.draw_real(&mut real).unwrap();
            g.draw_fft(&mut fft).unwrap();
            let tol = 1e-5 * peak(&real);
            for (a, b) in real.array().iter().zip(fft.array()) {
                assert!((a - b).abs() < tol, "{nx}x{ny}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_convolution_draws_by_fft() {
        let a: Profile = Gaussian::from_sigma(0.3).into();
        let b: Profile = Gaussian::from_sigma(0.4).into();
        let conv: Profile = Convolution::new([a, b]).unwrap().into();
        let direct: Profile = Gaussian::from_sigma(0.5).into();
        let mut image = Image::new(48, 48, 0.1);
        let mut expected = Image::new(48, 48, 0.1);
        let flux = conv.draw_image(&mut image, false).unwrap();
        direct.draw_image(&mut expected, false).unwrap();
        for (a, b) in image.array().iter().zip(expected.array()) {
            assert!((a - b).abs() < 1e-5 * peak(&expected));
        }
        assert_relative_eq!(flux, image.sum());
        assert_relative_eq!(flux, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_add_to_image() {
        let g: Profile = Gaussian::from_sigma(0.5).into();
        let mut once = Image::new(20, 20, 0.2);
        g.draw_image(&mut once, false).unwrap();
        let mut twice = once.clone();
        g.draw_image(&mut twice, true).unwrap();
        for (a, b) in twice.array().iter().zip(once.array()) {
            assert_relative_eq!(*a, 2.0 * b, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_draw_new_image_size() {
        let g: Profile = Gaussian::from_sigma(1.0).into();
        let image = g.draw_new_image(Some(0.1)).unwrap();
        let want = good_fft_size((2.0 * PI / (g.step_k() * 0.1)).ceil() as usize);
        assert_eq!(image.nx(), want);
        assert_eq!(image.ny(), want);
        assert_relative_eq!(image.sum(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_fft_too_large() {
        let small = GsParams {
            maximum_fft_size: 16,
            ..GsParams::default()
        };
        let psf: Profile = Gaussian::from_sigma(0.5).into();
        let pixel: Profile = Pixel::square(0.2).into();
        let conv: Profile = Convolution::with_gsparams([psf, pixel], small).unwrap().into();
        let mut image = Image::new(32, 32, 0.2);
        assert!(matches!(
            conv.draw_image(&mut image, false),
            Err(GalSimError::FftTooLarge { maximum: 16, .. })
        ));
    }

    #[test]
    fn test_unbounded_profile_refuses_fft() {
        let delta: Profile = DeltaFunction::new().into();
        let mut image = Image::new(16, 16, 0.2);
        assert!(matches!(
            delta.draw_image(&mut image, false),
            Err(GalSimError::FftTooLarge { .. })
        ));
    }

    #[test]
    fn test_draw_photons() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let g: Profile = Gaussian::from_sigma(0.3).with_flux(10.0).into();
        let mut image = Image::new(64, 64, 0.1);
        let placed = g.draw_photons(&mut image, 20_000, &mut rng, false).unwrap();
        assert_relative_eq!(placed, image.sum(), epsilon = 1e-9);
        assert_relative_eq!(placed, 10.0, epsilon = 1e-6);
    }
}
