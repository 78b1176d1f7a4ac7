//! Affine transformations with wavelength-dependent parameters.

use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};

use super::{ChromaticKind, ChromaticObject, WavelengthFn};

/// f'(x; λ) = r(λ)/|det J(λ)| · f(J(λ)⁻¹(x − o(λ)); λ)
#[derive(Debug, Clone)]
pub struct ChromaticTransformation {
    child: ChromaticObject,
    jac: WavelengthFn<Matrix2<f64>>,
    offset: WavelengthFn<Vector2<f64>>,
    flux_ratio: WavelengthFn<f64>,
}

impl ChromaticTransformation {
    /// Transform `obj`, folding into an existing transformation or, for fixed
    /// geometry, into a leaf's profile and SED.
    pub(crate) fn apply(
        obj: &ChromaticObject,
        jac: WavelengthFn<Matrix2<f64>>,
        offset: WavelengthFn<Vector2<f64>>,
        flux_ratio: WavelengthFn<f64>,
    ) -> ChromaticObject {
        match obj.kind() {
            ChromaticKind::Transformation(inner) => {
                let composed_jac = jac.zip_with(&inner.jac, |outer, inner| outer * inner);
                let composed_offset = jac
                    .zip_with(&inner.offset, |outer, inner| outer * inner)
                    .zip_with(&offset, |moved, shift| moved + shift);
                let composed_ratio = flux_ratio.zip_with(&inner.flux_ratio, |a, b| a * b);
                Self::apply(&inner.child, composed_jac, composed_offset, composed_ratio)
            }
            ChromaticKind::Chromatic { profile, sed } if jac.is_constant() && offset.is_constant() => {
                let (jac, offset) = (jac.at(0.0), offset.at(0.0));
                match flux_ratio {
                    WavelengthFn::Constant(r) => {
                        ChromaticObject::new(profile.transform(jac, offset, r), sed.clone())
                    }
                    WavelengthFn::Function(f) => ChromaticObject::new(
                        profile.transform(jac, offset, 1.0),
                        sed.weighted(Arc::clone(&f)),
                    ),
                }
            }
            _ => ChromaticObject::from_kind(ChromaticKind::Transformation(Self {
                child: obj.clone(),
                jac,
                offset,
                flux_ratio,
            })),
        }
    }

    pub fn child(&self) -> &ChromaticObject {
        &self.child
    }

    pub fn jacobian(&self) -> &WavelengthFn<Matrix2<f64>> {
        &self.jac
    }

    pub fn offset(&self) -> &WavelengthFn<Vector2<f64>> {
        &self.offset
    }

    pub fn flux_ratio(&self) -> &WavelengthFn<f64> {
        &self.flux_ratio
    }
}
