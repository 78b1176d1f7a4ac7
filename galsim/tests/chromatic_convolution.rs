//! Distribution of convolutions over chromatic sums, and the auto operations.

mod common;

use approx::assert_relative_eq;
use common::{bulge, disk, init_logging, max_abs_diff, peak, pixel, r_band, seeing_psf};
use galsim::units::{Angle, AngleExt};
use galsim::{
    ChromaticDrawOptions, ChromaticKind, ChromaticObject, Gaussian, Image, Profile, Sed,
    SurfaceBrightness,
};
use nalgebra::Vector2;

fn gaussian(fwhm: f64, sed: Sed) -> ChromaticObject {
    Profile::from(Gaussian::from_fwhm(fwhm)) * sed
}

/// Two-component PSF whose components carry different spectra.
fn psf_pair() -> (ChromaticObject, ChromaticObject) {
    (
        gaussian(0.6, Sed::from_fn(|w| w / 600.0)),
        gaussian(0.9, Sed::constant(0.5)),
    )
}

fn sum(items: impl IntoIterator<Item = ChromaticObject>) -> ChromaticObject {
    ChromaticObject::sum(items).unwrap()
}

fn conv(items: impl IntoIterator<Item = ChromaticObject>) -> ChromaticObject {
    ChromaticObject::convolve(items, None).unwrap()
}

fn render(obj: &ChromaticObject, image: &mut Image, add: bool) {
    let opts = ChromaticDrawOptions::default().with_add_to_image(add);
    obj.draw_image(&r_band(), image, &opts).unwrap();
}

fn draw(obj: &ChromaticObject) -> Image {
    let mut image = Image::new(64, 64, 0.1);
    render(obj, &mut image, false);
    image
}

#[test]
fn test_two_sums_distribute_over_the_first() {
    init_logging();
    let (c, d) = psf_pair();
    let galaxy = sum([bulge(), disk()]);
    let psf = sum([c, d]);
    assert!(!galaxy.is_separable() && !psf.is_separable());

    let obj = conv([galaxy, psf.clone(), pixel(0.1)]);
    let ChromaticKind::Sum(distributed) = obj.kind() else {
        panic!("expected the convolution to distribute into a sum");
    };
    assert_eq!(distributed.terms().len(), 2);
    for term in distributed.terms() {
        let ChromaticKind::Convolution(branch) = term.kind() else {
            panic!("expected convolution branches");
        };
        let sums = branch
            .items()
            .iter()
            .filter(|item| matches!(item.kind(), ChromaticKind::Sum(_)))
            .count();
        assert_eq!(sums, 1);
    }

    let combined = draw(&obj);
    let mut expanded = Image::new(64, 64, 0.1);
    render(&conv([bulge(), psf.clone(), pixel(0.1)]), &mut expanded, false);
    render(&conv([disk(), psf, pixel(0.1)]), &mut expanded, true);
    assert!(max_abs_diff(&combined, &expanded) < 1e-10 * peak(&combined));

    let mut generic = Image::new(64, 64, 0.1);
    obj.draw_image_generic(&r_band(), &mut generic, &ChromaticDrawOptions::default())
        .unwrap();
    assert!(max_abs_diff(&combined, &generic) < 1e-5 * peak(&generic));
}

#[test]
fn test_three_sums_expand_to_every_cross_term() {
    init_logging();
    let (c, d) = psf_pair();
    let e = gaussian(0.2, Sed::unity());
    let f = gaussian(0.3, Sed::from_fn(|w| 500.0 / w));
    let operands = [
        [bulge(), disk()],
        [c.clone(), d.clone()],
        [e.clone(), f.clone()],
    ];

    let obj = conv(operands.iter().map(|pair| sum(pair.iter().cloned())));
    let ChromaticKind::Sum(distributed) = obj.kind() else {
        panic!("expected a sum");
    };
    // the first two sums are split, the third stays as an operand
    assert_eq!(distributed.terms().len(), 4);

    let mut expanded = Image::new(64, 64, 0.1);
    let mut first = true;
    for x in &operands[0] {
        for y in &operands[1] {
            for z in &operands[2] {
                let term = conv([x.clone(), y.clone(), z.clone()]);
                assert!(term.is_separable());
                render(&term, &mut expanded, !first);
                first = false;
            }
        }
    }
    let combined = draw(&obj);
    assert!(max_abs_diff(&combined, &expanded) < 1e-10 * peak(&combined));
}

#[test]
fn test_auto_convolve_matches_convolve() {
    init_logging();
    let separable = bulge();
    let a = draw(&separable.auto_convolve());
    let b = draw(&conv([separable.clone(), separable]));
    assert!(max_abs_diff(&a, &b) < 1e-10 * peak(&b));

    let seeing = seeing_psf(0.5).shift(Vector2::new(0.1, 0.05));
    let a = draw(&seeing.auto_convolve());
    let b = draw(&conv([seeing.clone(), seeing]));
    assert!(max_abs_diff(&a, &b) < 1e-10 * peak(&b));
}

#[test]
fn test_auto_correlate_matches_rotated_convolve() {
    init_logging();
    let obj = (disk() * 1.5).shift(Vector2::new(0.2, -0.1));
    let a = draw(&obj.auto_correlate());
    let b = draw(&conv([obj.clone(), obj.rotate(Angle::from_degrees(180.0))]));
    assert!(max_abs_diff(&a, &b) < 1e-10 * peak(&b));

    let centroid = obj
        .auto_correlate()
        .evaluate_at_wavelength(600.0)
        .unwrap()
        .centroid();
    assert_relative_eq!(centroid.norm(), 0.0, epsilon = 1e-12);
}
