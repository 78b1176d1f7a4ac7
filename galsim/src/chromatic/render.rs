//! Rendering chromatic objects through a bandpass.
//!
//! The broadband image is ∫ img(λ)·T(λ) dλ. How it is computed depends on
//! the structure of the object:
//!
//! - **Separable** objects draw their shape once, scaled by ∫ SED·T.
//! - **Inseparable sums** draw each grouped component and add them.
//! - **Convolutions** with an inseparable sum operand are distributed over
//!   that sum.
//! - **Convolutions with one inseparable factor** integrate that factor,
//!   weighted by the SEDs of the other factors, into an interpolated image,
//!   then convolve it with the other shapes and draw once.
//! - **Constant flux scalings** render the child and scale the pixels.
//! - Anything else takes the generic path, drawing the monochromatic
//!   profile at every quadrature node.

use std::f64::consts::PI;

use log::debug;
use nalgebra::{Matrix2, Vector2};

use super::integrate::WavelengthIntegrator;
use super::{ChromaticKind, ChromaticObject, WavelengthFn};
use crate::algo::good_fft_size;
use crate::error::{GalSimError, Result};
use crate::gsparams::GsParams;
use crate::image_proc::Image;
use crate::photometry::{Bandpass, Sed};
use crate::profile::{Convolution, Interpolant, InterpolatedImage, Profile};

/// Controls for [`ChromaticObject::draw_image`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChromaticDrawOptions {
    /// Overrides the automatic choice of quadrature
    pub integrator: Option<WavelengthIntegrator>,
    /// Oversampling of the interpolated-image surrogate relative to Nyquist
    pub iimult: Option<f64>,
    /// Add to the existing pixels instead of overwriting them
    pub add_to_image: bool,
}

impl ChromaticDrawOptions {
    pub fn with_integrator(mut self, integrator: impl Into<WavelengthIntegrator>) -> Self {
        self.integrator = Some(integrator.into());
        self
    }

    pub fn with_iimult(mut self, iimult: f64) -> Self {
        self.iimult = Some(iimult);
        self
    }

    pub fn with_add_to_image(mut self, add_to_image: bool) -> Self {
        self.add_to_image = add_to_image;
        self
    }
}

impl ChromaticObject {
    /// Render into `image` through `bandpass`, returning the flux placed on it.
    ///
    /// # Errors
    /// Propagates rendering failures such as `FftTooLarge` and rejects a
    /// non-positive `iimult`.
    pub fn draw_image(
        &self,
        bandpass: &Bandpass,
        image: &mut Image,
        options: &ChromaticDrawOptions,
    ) -> Result<f64> {
        if let Some(iimult) = options.iimult {
            if !(iimult > 0.0 && iimult.is_finite()) {
                return Err(GalSimError::InvalidArgument(format!(
                    "iimult must be positive, got {iimult}"
                )));
            }
        }
        if options.add_to_image {
            let mut scratch = image.zeros_like();
            let flux = self.render(bandpass, &mut scratch, options)?;
            image.add_scaled(&scratch, 1.0);
            return Ok(flux);
        }
        self.render(bandpass, image, options)
    }

    /// Render by drawing the monochromatic profile at every quadrature node.
    ///
    /// Always correct, and the reference the accelerated paths are held to.
    pub fn draw_image_generic(
        &self,
        bandpass: &Bandpass,
        image: &mut Image,
        options: &ChromaticDrawOptions,
    ) -> Result<f64> {
        let wave_list = self.integration_wave_list(bandpass);
        let integrator = options
            .integrator
            .unwrap_or_else(|| WavelengthIntegrator::select(&wave_list));
        debug!("generic chromatic draw with {integrator:?}");
        let draw = |w: f64, target: &mut Image| {
            self.evaluate_at_wavelength(w)?.draw_image(target, false)
        };
        if options.add_to_image {
            let mut scratch = image.zeros_like();
            let flux = integrator.integrate_image(bandpass, &wave_list, &mut scratch, draw)?;
            image.add_scaled(&scratch, 1.0);
            return Ok(flux);
        }
        integrator.integrate_image(bandpass, &wave_list, image, draw)
    }

    /// Render into a new square image sized for the profile at the
    /// bandpass's effective wavelength.
    ///
    /// `scale` defaults to that profile's Nyquist scale.
    pub fn draw_new_image(
        &self,
        bandpass: &Bandpass,
        scale: Option<f64>,
        options: &ChromaticDrawOptions,
    ) -> Result<Image> {
        let profile = self.evaluate_at_wavelength(bandpass.effective_wavelength())?;
        let scale = scale.unwrap_or_else(|| profile.nyquist_scale());
        let n = good_fft_size((2.0 * PI / (profile.step_k() * scale)).ceil() as usize);
        let mut image = Image::new(n, n, scale);
        self.draw_image(bandpass, &mut image, &options.with_add_to_image(false))?;
        Ok(image)
    }

    /// Total flux through `bandpass`.
    pub fn calculate_flux(&self, bandpass: &Bandpass) -> Result<f64> {
        if let Some((shape, sed)) = self.separable_parts() {
            return Ok(shape.flux() * sed.calculate_flux(bandpass));
        }
        let wave_list = self.integration_wave_list(bandpass);
        WavelengthIntegrator::select(&wave_list).integrate_scalar(bandpass, &wave_list, |w| {
            Ok(self.evaluate_at_wavelength(w)?.flux())
        })
    }

    /// Flux-weighted centroid through `bandpass`, ∫c(λ)f(λ)T(λ)dλ / ∫f(λ)T(λ)dλ.
    pub fn centroid(&self, bandpass: &Bandpass) -> Result<Vector2<f64>> {
        if let Some((shape, _)) = self.separable_parts() {
            return Ok(shape.centroid());
        }
        let wave_list = self.integration_wave_list(bandpass);
        let mut moment = Vector2::zeros();
        let mut flux = 0.0;
        for (w, weight) in WavelengthIntegrator::auto_quadrature(bandpass, &wave_list) {
            if weight == 0.0 {
                continue;
            }
            let profile = self.evaluate_at_wavelength(w)?;
            moment += profile.centroid() * (weight * profile.flux());
            flux += weight * profile.flux();
        }
        Ok(moment / flux)
    }

    fn integration_wave_list(&self, bandpass: &Bandpass) -> Vec<f64> {
        bandpass.integration_wave_list(self.wave_list())
    }

    fn integrator_for(
        &self,
        bandpass: &Bandpass,
        options: &ChromaticDrawOptions,
    ) -> WavelengthIntegrator {
        options.integrator.unwrap_or_else(|| {
            WavelengthIntegrator::select(&self.integration_wave_list(bandpass))
        })
    }

    /// Overwrite `image`, choosing the cheapest correct path.
    fn render(
        &self,
        bandpass: &Bandpass,
        image: &mut Image,
        options: &ChromaticDrawOptions,
    ) -> Result<f64> {
        if let Some((shape, sed)) = self.separable_parts() {
            let wave_list = self.integration_wave_list(bandpass);
            let flux = self
                .integrator_for(bandpass, options)
                .integrate_scalar(bandpass, &wave_list, |w| Ok(sed.at(w)))?;
            debug!(
                "separable chromatic draw of {}: one monochromatic image",
                shape.name()
            );
            return shape.with_scaled_flux(flux).draw_image(image, false);
        }

        match self.kind() {
            ChromaticKind::Sum(sum) => {
                debug!("inseparable sum: drawing {} components", sum.objlist().len());
                let Some((first, rest)) = sum.objlist().split_first() else {
                    return Ok(0.0);
                };
                let mut total = first.render(bandpass, image, options)?;
                if !rest.is_empty() {
                    let mut scratch = image.zeros_like();
                    for component in rest {
                        total += component.render(bandpass, &mut scratch, options)?;
                        image.add_scaled(&scratch, 1.0);
                    }
                }
                Ok(total)
            }
            ChromaticKind::Convolution(conv) => {
                let items = conv.items();
                let inseparable_sum = items.iter().enumerate().find_map(|(i, item)| {
                    item.as_sum()
                        .filter(|sum| !sum.is_separable())
                        .map(|sum| (i, sum.objlist().to_vec()))
                });
                if let Some((index, terms)) = inseparable_sum {
                    debug!(
                        "distributing convolution over {} sum components at draw time",
                        terms.len()
                    );
                    let mut total = 0.0;
                    let mut scratch = image.zeros_like();
                    for (n, term) in terms.into_iter().enumerate() {
                        let mut branch = items.to_vec();
                        branch[index] = term;
                        let branch = ChromaticObject::convolve(branch, conv.gsparams())?;
                        if n == 0 {
                            total += branch.render(bandpass, image, options)?;
                        } else {
                            total += branch.render(bandpass, &mut scratch, options)?;
                            image.add_scaled(&scratch, 1.0);
                        }
                    }
                    return Ok(total);
                }

                let mut shapes = Vec::with_capacity(items.len());
                let mut sed = Sed::unity();
                let mut inseparable = Vec::new();
                for item in items {
                    match item.separable_parts() {
                        Some((shape, item_sed)) => {
                            shapes.push(shape);
                            sed = sed.product(&item_sed);
                        }
                        None => inseparable.push(item),
                    }
                }
                match inseparable.as_slice() {
                    [factor] => {
                        let wave_list = self.integration_wave_list(bandpass);
                        let surrogate = Surrogate {
                            factor,
                            shapes,
                            sed: &sed,
                            gsparams: conv.gsparams(),
                        };
                        surrogate.draw(bandpass, &wave_list, image, options)
                    }
                    _ => {
                        let options = options.with_add_to_image(false);
                        self.draw_image_generic(bandpass, image, &options)
                    }
                }
            }
            ChromaticKind::Transformation(t) => match (t.jacobian(), t.offset(), t.flux_ratio()) {
                (
                    WavelengthFn::Constant(jac),
                    WavelengthFn::Constant(offset),
                    WavelengthFn::Constant(r),
                ) if *jac == Matrix2::identity() && *offset == Vector2::zeros() => {
                    debug!("constant flux scaling by {r}");
                    let flux = t.child().render(bandpass, image, options)?;
                    image.scale_values(*r);
                    Ok(r * flux)
                }
                _ => self.draw_image_generic(bandpass, image, &options.with_add_to_image(false)),
            },
            _ => self.draw_image_generic(bandpass, image, &options.with_add_to_image(false)),
        }
    }
}

/// One inseparable factor of a convolution together with the separable rest.
struct Surrogate<'a> {
    factor: &'a ChromaticObject,
    shapes: Vec<Profile>,
    sed: &'a Sed,
    gsparams: Option<GsParams>,
}

impl Surrogate<'_> {
    /// Integrate `factor · sed · T` over wavelength into an interpolated
    /// image, convolve it with the fixed shapes and draw the result once.
    fn draw(
        self,
        bandpass: &Bandpass,
        wave_list: &[f64],
        image: &mut Image,
        options: &ChromaticDrawOptions,
    ) -> Result<f64> {
        let reference = self
            .factor
            .evaluate_at_wavelength(bandpass.effective_wavelength())?;
        let mut step_k = reference.step_k();
        let mut max_k = reference.max_k();
        for w in [bandpass.blue_limit(), bandpass.red_limit()] {
            let profile = self.factor.evaluate_at_wavelength(w)?;
            step_k = step_k.min(profile.step_k());
            max_k = max_k.max(profile.max_k());
        }

        let scale = reference.nyquist_scale() / options.iimult.unwrap_or(1.0);
        let n = good_fft_size((2.0 * PI / (step_k * scale)).ceil() as usize);
        debug!(
            "interpolated-image surrogate: {n}x{n} at {scale:.5} arcsec, max_k {max_k:.3}, \
             {} fixed shapes",
            self.shapes.len()
        );

        let integrator = options
            .integrator
            .unwrap_or_else(|| WavelengthIntegrator::select(wave_list));
        let mut surrogate = Image::new(n, n, scale);
        integrator.integrate_image(bandpass, wave_list, &mut surrogate, |w, target| {
            self.factor
                .evaluate_at_wavelength(w)?
                .with_scaled_flux(self.sed.at(w))
                .draw_image(target, false)
        })?;

        let gsparams = self.gsparams.unwrap_or(*reference.gsparams());
        let interpolated: Profile = InterpolatedImage::from_image(&surrogate)?
            .with_interpolant(Interpolant::Quintic)
            .with_max_k(max_k)
            .with_gsparams(gsparams)
            .into();
        let mut items = Vec::with_capacity(self.shapes.len() + 1);
        items.push(interpolated);
        items.extend(self.shapes);
        let profile: Profile = Convolution::build(items, Some(gsparams))?.into();
        profile.draw_image(image, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Gaussian, Pixel};
    use approx::assert_relative_eq;

    fn bandpass() -> Bandpass {
        Bandpass::from_samples(vec![500.0, 550.0, 600.0, 650.0, 700.0], vec![0.2, 0.8, 1.0, 0.7, 0.1])
            .unwrap()
    }

    fn sed() -> Sed {
        Sed::from_samples(vec![450.0, 600.0, 750.0], vec![1.0, 2.0, 1.5]).unwrap()
    }

    fn seeing_psf() -> ChromaticObject {
        ChromaticObject::from(Profile::from(Gaussian::from_half_light_radius(0.3)))
            .dilate(WavelengthFn::function(|w| (w / 500.0).powf(-0.2)))
    }

    fn max_abs_diff(a: &Image, b: &Image) -> f64 {
        a.array()
            .iter()
            .zip(b.array())
            .fold(0.0_f64, |m, (x, y)| m.max((x - y).abs()))
    }

    fn peak(image: &Image) -> f64 {
        image.array().iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    #[test]
    fn test_separable_draw_matches_generic() {
        let gal = Profile::from(Gaussian::from_sigma(0.5)) * sed();
        let mut fast = Image::new(32, 32, 0.2);
        let mut slow = Image::new(32, 32, 0.2);
        let opts = ChromaticDrawOptions::default();
        let f1 = gal.draw_image(&bandpass(), &mut fast, &opts).unwrap();
        let f2 = gal.draw_image_generic(&bandpass(), &mut slow, &opts).unwrap();
        assert!(max_abs_diff(&fast, &slow) < 1e-12 * peak(&fast).max(1.0));
        assert_relative_eq!(f1, f2, max_relative = 1e-10);
        assert_relative_eq!(
            f1,
            gal.calculate_flux(&bandpass()).unwrap(),
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_interpolated_image_path_matches_generic() {
        let gal = Profile::from(Gaussian::from_sigma(0.6)) * sed();
        let pixel: ChromaticObject = Profile::from(Pixel::square(0.2)).into();
        let obj = ChromaticObject::convolve([gal, seeing_psf(), pixel], None).unwrap();
        assert!(!obj.is_separable());

        let opts = ChromaticDrawOptions::default().with_iimult(4.0);
        let mut fast = Image::new(32, 32, 0.2);
        let mut slow = Image::new(32, 32, 0.2);
        obj.draw_image(&bandpass(), &mut fast, &opts).unwrap();
        obj.draw_image_generic(&bandpass(), &mut slow, &opts).unwrap();
        assert!(max_abs_diff(&fast, &slow) < 1e-5 * peak(&slow));
        assert_relative_eq!(fast.sum(), slow.sum(), max_relative = 1e-6);
    }

    #[test]
    fn test_add_to_image() {
        let gal = Profile::from(Gaussian::from_sigma(0.5)) * sed();
        let mut once = Image::new(16, 16, 0.2);
        gal.draw_image(&bandpass(), &mut once, &ChromaticDrawOptions::default())
            .unwrap();
        let mut twice = once.clone();
        gal.draw_image(
            &bandpass(),
            &mut twice,
            &ChromaticDrawOptions::default().with_add_to_image(true),
        )
        .unwrap();
        for (a, b) in twice.array().iter().zip(once.array()) {
            assert_relative_eq!(*a, 2.0 * b, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_rejects_bad_iimult() {
        let gal = Profile::from(Gaussian::from_sigma(0.5)) * sed();
        let mut image = Image::new(16, 16, 0.2);
        let opts = ChromaticDrawOptions::default().with_iimult(0.0);
        assert!(matches!(
            gal.draw_image(&bandpass(), &mut image, &opts),
            Err(GalSimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fft_limit_propagates() {
        let small = GsParams {
            maximum_fft_size: 16,
            ..GsParams::default()
        };
        let gal = Profile::from(Gaussian::from_sigma(0.5)) * sed();
        let obj = ChromaticObject::convolve([gal, seeing_psf()], Some(small)).unwrap();
        let mut image = Image::new(32, 32, 0.2);
        let result = obj.draw_image(&bandpass(), &mut image, &ChromaticDrawOptions::default());
        assert!(matches!(result, Err(GalSimError::FftTooLarge { .. })));
    }

    #[test]
    fn test_draw_new_image_defaults_to_nyquist() {
        let gal = Profile::from(Gaussian::from_sigma(0.5)) * sed();
        let image = gal
            .draw_new_image(&bandpass(), None, &ChromaticDrawOptions::default())
            .unwrap();
        let reference = gal
            .evaluate_at_wavelength(bandpass().effective_wavelength())
            .unwrap();
        assert_relative_eq!(image.scale(), reference.nyquist_scale());
        assert_eq!(image.nx(), image.ny());
        assert_relative_eq!(
            image.sum(),
            gal.calculate_flux(&bandpass()).unwrap(),
            max_relative = 5e-3
        );
    }
}
