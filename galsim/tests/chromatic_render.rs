//! Broadband rendering of galaxies made of differently coloured components.

mod common;

use approx::assert_relative_eq;
use common::{bulge, disk, init_logging, max_abs_diff, peak, pixel, r_band, seeing_psf};
use galsim::{
    add, convolve, Bandpass, ChromaticDrawOptions, ChromaticKind, ChromaticObject, Component,
    ContinuousIntegrator, GalSimError, Gaussian, GsParams, Image, IntegrationRule, Profile,
    SampleIntegrator, Sed, Shear, WavelengthFn, WavelengthIntegrator,
};
use nalgebra::Vector2;

fn psf(fwhm: f64) -> ChromaticObject {
    Profile::from(Gaussian::from_fwhm(fwhm)).into()
}

fn draw(obj: &ChromaticObject, options: &ChromaticDrawOptions) -> Image {
    let mut image = Image::new(48, 48, 0.2);
    obj.draw_image(&r_band(), &mut image, options)
        .expect("broadband draw");
    image
}

fn draw_generic(obj: &ChromaticObject, options: &ChromaticDrawOptions) -> Image {
    let mut image = Image::new(48, 48, 0.2);
    obj.draw_image_generic(&r_band(), &mut image, options)
        .expect("generic broadband draw");
    image
}

#[test]
fn test_add_is_commutative() {
    init_logging();
    let bd = add([bulge(), disk()]).unwrap().into_chromatic();
    let db = add([disk(), bulge()]).unwrap().into_chromatic();
    let opts = ChromaticDrawOptions::default();
    let a = draw(
        &ChromaticObject::convolve([bd, seeing_psf(0.7), pixel(0.2)], None).unwrap(),
        &opts,
    );
    let b = draw(
        &ChromaticObject::convolve([db, seeing_psf(0.7), pixel(0.2)], None).unwrap(),
        &opts,
    );
    assert!(max_abs_diff(&a, &b) < 1e-12 * peak(&a));
}

#[test]
fn test_separable_fast_path_matches_generic() {
    init_logging();
    let obj = ChromaticObject::convolve([bulge(), psf(0.7), pixel(0.2)], None).unwrap();
    assert!(obj.is_separable());
    let opts = ChromaticDrawOptions::default();
    let fast = draw(&obj, &opts);
    let slow = draw_generic(&obj, &opts);
    assert!(max_abs_diff(&fast, &slow) < 1e-6 * peak(&slow));
}

#[test]
fn test_interpolated_image_fast_path_matches_generic() {
    init_logging();
    let obj = ChromaticObject::convolve([bulge(), seeing_psf(0.7), pixel(0.2)], None).unwrap();
    assert!(!obj.is_separable());
    let opts = ChromaticDrawOptions::default().with_iimult(4.0);
    let fast = draw(&obj, &opts);
    let slow = draw_generic(&obj, &opts);
    assert!(max_abs_diff(&fast, &slow) < 1e-5 * peak(&slow));
    assert_relative_eq!(fast.sum(), slow.sum(), max_relative = 1e-6);
}

#[test]
fn test_flux_is_linear() {
    init_logging();
    let galaxy = add([bulge(), disk()]).unwrap().into_chromatic();
    let obj = ChromaticObject::convolve([galaxy, seeing_psf(0.7), pixel(0.2)], None).unwrap();
    let opts = ChromaticDrawOptions::default();
    let base = draw(&obj, &opts);
    for k in [2.0, -0.5, 0.37] {
        let scaled = draw(&(k * obj.clone()), &opts);
        assert_relative_eq!(scaled.sum(), k * base.sum(), max_relative = 1e-10);
    }
    let doubled = bulge() * 2.0;
    assert_relative_eq!(
        doubled.calculate_flux(&r_band()).unwrap(),
        2.0 * bulge().calculate_flux(&r_band()).unwrap(),
        max_relative = 1e-12
    );
}

#[test]
fn test_sampled_and_continuous_integration_agree() {
    init_logging();
    let waves: Vec<f64> = (0..=200).map(|i| 500.0 + i as f64).collect();
    let band = Bandpass::from_samples(waves.clone(), vec![1.0; waves.len()]).unwrap();
    let galaxy = Profile::from(Gaussian::from_sigma(0.4)) * Sed::from_fn(|w| (w / 500.0).powi(2));
    let obj = ChromaticObject::convolve([galaxy, seeing_psf(0.7), pixel(0.2)], None).unwrap();

    let mut sampled = Image::new(48, 48, 0.2);
    obj.draw_image_generic(&band, &mut sampled, &ChromaticDrawOptions::default())
        .unwrap();
    let mut continuous = Image::new(48, 48, 0.2);
    let trapezoid = ContinuousIntegrator::default()
        .with_rule(IntegrationRule::Trapezoid)
        .with_intervals(1000);
    obj.draw_image_generic(
        &band,
        &mut continuous,
        &ChromaticDrawOptions::default().with_integrator(trapezoid),
    )
    .unwrap();
    assert!(max_abs_diff(&sampled, &continuous) < 1e-5 * peak(&sampled));
}

#[test]
fn test_transforms_commute_with_sed() {
    init_logging();
    let shape = Profile::from(Gaussian::from_sigma(0.5));
    let sed = common::bulge_sed();
    let shear = Shear::new(0.1, 0.25).unwrap();
    let offset = Vector2::new(0.15, -0.2);

    let first = (shape.clone() * sed.clone()).shear(shear).shift(offset).dilate(1.3);
    let last = ChromaticObject::from(shape.shear(shear).shift_by(offset).dilate(1.3)) * sed.clone();
    let opts = ChromaticDrawOptions::default();
    let a = draw(&first, &opts);
    let b = draw(&last, &opts);
    assert!(max_abs_diff(&a, &b) < 1e-10 * peak(&a));

    let stretch = WavelengthFn::function(|w| 1.0 + (w - 500.0) / 1000.0);
    let first = (shape.clone() * sed.clone()).dilate(stretch.clone());
    let last = ChromaticObject::from(shape).dilate(stretch) * sed;
    let a = draw(&first, &opts);
    let b = draw(&last, &opts);
    assert!(max_abs_diff(&a, &b) < 1e-10 * peak(&a));
}

#[test]
fn test_grouping_by_sed() {
    let same = add([bulge(), bulge().shift(Vector2::new(0.5, 0.0))])
        .unwrap()
        .into_chromatic();
    assert!(same.is_separable());

    let mixed = ChromaticObject::sum([bulge(), disk(), bulge().dilate(2.0)]).unwrap();
    assert!(!mixed.is_separable());
    let ChromaticKind::Sum(sum) = mixed.kind() else {
        panic!("expected a sum");
    };
    assert_eq!(sum.terms().len(), 3);
    assert_eq!(sum.objlist().len(), 2);
    assert!(sum.objlist().iter().all(|c| c.is_separable()));
    assert!(matches!(sum.objlist()[0].kind(), ChromaticKind::Sum(_)));
    assert!(matches!(sum.objlist()[1].kind(), ChromaticKind::Chromatic { .. }));

    let opts = ChromaticDrawOptions::default();
    let grouped = draw(&mixed, &opts);
    let generic = draw_generic(&mixed, &opts);
    assert!(max_abs_diff(&grouped, &generic) < 1e-10 * peak(&generic));
}

#[test]
fn test_mixed_components_promote_to_chromatic() {
    let star = Component::from(Profile::from(Gaussian::from_sigma(0.3)));
    let galaxy = Component::from(bulge());
    let composite = convolve([galaxy, star]).unwrap();
    assert!(composite.is_chromatic());
    assert!(composite.into_chromatic().is_separable());
}

#[test]
fn test_fft_limit_surfaces_from_draw() {
    let tiny = GsParams {
        maximum_fft_size: 16,
        ..GsParams::default()
    };
    let obj = ChromaticObject::convolve([bulge(), psf(0.7)], Some(tiny)).unwrap();
    let mut image = Image::new(32, 32, 0.2);
    let result = obj.draw_image(&r_band(), &mut image, &ChromaticDrawOptions::default());
    assert!(matches!(
        result,
        Err(GalSimError::FftTooLarge { maximum: 16, .. })
    ));
}

#[test]
fn test_centroid_of_wavelength_dependent_shift() {
    // t = (λ − 500)/200 runs over [0, 1]: SED t², shift (t, 0), so ⟨x⟩ = ∫t³/∫t² = 3/4
    let t = |w: f64| (w - 500.0) / 200.0;
    let obj = (Profile::from(Gaussian::from_sigma(0.5)) * Sed::from_fn(move |w| t(w).powi(2)))
        .shift(WavelengthFn::function(move |w| Vector2::new(t(w), 0.0)));

    let analytic = Bandpass::from_fn(|_| 1.0, 500.0, 700.0).unwrap();
    let c = obj.centroid(&analytic).unwrap();
    assert_relative_eq!(c.x, 0.75, epsilon = 1e-4);
    assert_relative_eq!(c.y, 0.0, epsilon = 1e-12);

    let waves: Vec<f64> = (0..=1000).map(|i| 500.0 + 0.2 * i as f64).collect();
    let sampled = Bandpass::from_samples(waves.clone(), vec![1.0; waves.len()]).unwrap();
    let c = obj.centroid(&sampled).unwrap();
    assert_relative_eq!(c.x, 0.75, epsilon = 1e-5);
}

#[test]
fn test_explicit_integrator_overrides_selection() {
    let analytic = Bandpass::from_fn(|_| 1.0, 500.0, 700.0).unwrap();
    let seeing = seeing_psf(0.7);
    assert!(seeing.wave_list().is_empty());
    let mut image = Image::new(16, 16, 0.2);
    let continuous = ChromaticDrawOptions::default().with_integrator(WavelengthIntegrator::default());
    assert!(seeing.draw_image(&analytic, &mut image, &continuous).is_ok());
    let sampled = ChromaticDrawOptions::default().with_integrator(SampleIntegrator);
    assert!(matches!(
        seeing.draw_image(&analytic, &mut image, &sampled),
        Err(GalSimError::InvalidArgument(_))
    ));
}
