//! Factories that accept a mix of monochromatic and chromatic inputs.
//!
//! `add` and `convolve` build a plain [`Profile`] composite when every input
//! is monochromatic and a [`ChromaticObject`] otherwise, promoting plain
//! profiles to chromatic leaves with a unit SED.

use log::trace;

use crate::chromatic::ChromaticObject;
use crate::error::{GalSimError, Result};
use crate::profile::{Convolution, Profile, Sum};

/// A single input to [`add`] or [`convolve`].
#[derive(Debug, Clone)]
pub enum Component {
    Profile(Profile),
    Chromatic(ChromaticObject),
}

impl Component {
    pub fn is_chromatic(&self) -> bool {
        matches!(self, Component::Chromatic(_))
    }

    fn into_chromatic(self) -> ChromaticObject {
        match self {
            Component::Profile(p) => p.into(),
            Component::Chromatic(c) => c,
        }
    }
}

impl From<Profile> for Component {
    fn from(profile: Profile) -> Self {
        Component::Profile(profile)
    }
}

impl From<ChromaticObject> for Component {
    fn from(obj: ChromaticObject) -> Self {
        Component::Chromatic(obj)
    }
}

/// Result of [`add`] or [`convolve`].
#[derive(Debug, Clone)]
pub enum Composite {
    Profile(Profile),
    Chromatic(ChromaticObject),
}

impl Composite {
    pub fn is_chromatic(&self) -> bool {
        matches!(self, Composite::Chromatic(_))
    }

    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Composite::Profile(p) => Some(p),
            Composite::Chromatic(_) => None,
        }
    }

    pub fn as_chromatic(&self) -> Option<&ChromaticObject> {
        match self {
            Composite::Profile(_) => None,
            Composite::Chromatic(c) => Some(c),
        }
    }

    /// The monochromatic composite.
    ///
    /// # Errors
    /// `TypeMismatch` if the composite is chromatic.
    pub fn into_profile(self) -> Result<Profile> {
        match self {
            Composite::Profile(p) => Ok(p),
            Composite::Chromatic(_) => Err(GalSimError::TypeMismatch {
                expected: "Profile",
                found: "ChromaticObject",
            }),
        }
    }

    /// The composite as a chromatic object, promoting a plain profile.
    pub fn into_chromatic(self) -> ChromaticObject {
        match self {
            Composite::Profile(p) => p.into(),
            Composite::Chromatic(c) => c,
        }
    }
}

impl From<Composite> for Component {
    fn from(composite: Composite) -> Self {
        match composite {
            Composite::Profile(p) => Component::Profile(p),
            Composite::Chromatic(c) => Component::Chromatic(c),
        }
    }
}

fn split(items: impl IntoIterator<Item = impl Into<Component>>) -> Result<Vec<Component>> {
    let items: Vec<Component> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        return Err(GalSimError::InvalidArgument(
            "at least one item is required".to_string(),
        ));
    }
    Ok(items)
}

fn profiles(items: Vec<Component>) -> Vec<Profile> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Component::Profile(p) => Some(p),
            Component::Chromatic(_) => None,
        })
        .collect()
}

/// Sum of the inputs, chromatic if any input is.
///
/// # Errors
/// `InvalidArgument` if `items` is empty.
pub fn add(items: impl IntoIterator<Item = impl Into<Component>>) -> Result<Composite> {
    let items = split(items)?;
    if items.iter().any(Component::is_chromatic) {
        trace!("add: chromatic sum of {} items", items.len());
        let objs = items.into_iter().map(Component::into_chromatic);
        return Ok(Composite::Chromatic(ChromaticObject::sum(objs)?));
    }
    Ok(Composite::Profile(Sum::new(profiles(items))?.into()))
}

/// Convolution of the inputs, chromatic if any input is.
///
/// # Errors
/// `InvalidArgument` if `items` is empty.
pub fn convolve(items: impl IntoIterator<Item = impl Into<Component>>) -> Result<Composite> {
    let items = split(items)?;
    if items.iter().any(Component::is_chromatic) {
        trace!("convolve: chromatic convolution of {} items", items.len());
        let objs = items.into_iter().map(Component::into_chromatic);
        return Ok(Composite::Chromatic(ChromaticObject::convolve(objs, None)?));
    }
    Ok(Composite::Profile(Convolution::new(profiles(items))?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::Sed;
    use crate::profile::{Gaussian, Pixel, SurfaceBrightness};
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn gauss(sigma: f64) -> Profile {
        Gaussian::from_sigma(sigma).into()
    }

    #[test]
    fn test_add_profiles_stays_monochromatic() {
        let total = add([gauss(1.0), gauss(2.0).with_flux(3.0)]).unwrap();
        assert!(!total.is_chromatic());
        assert_relative_eq!(total.into_profile().unwrap().flux(), 4.0);
    }

    #[test]
    fn test_mixed_inputs_promote() {
        let star: Component = (gauss(0.5) * Sed::from_fn(|w| w / 500.0)).into();
        let total = add([Component::from(gauss(1.0)), star]).unwrap();
        assert!(total.is_chromatic());
        let obj = total.as_chromatic().unwrap();
        let p = obj.evaluate_at_wavelength(1000.0).unwrap();
        assert_relative_eq!(p.flux(), 3.0, epsilon = 1e-12);
        assert!(matches!(
            total.into_profile(),
            Err(GalSimError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_convolve_profiles() {
        let conv = convolve([gauss(0.3), Pixel::square(0.2).into()]).unwrap();
        let p = conv.as_profile().unwrap();
        assert_relative_eq!(p.k_value(Vector2::zeros()).re, 1.0, epsilon = 1e-12);

        let chromatic = convolve([
            Component::from(gauss(0.3) * Sed::constant(2.0)),
            Component::from(gauss(0.4)),
        ])
        .unwrap();
        assert!(chromatic.is_chromatic());
        assert!(chromatic.into_chromatic().is_separable());
    }

    #[test]
    fn test_empty_input() {
        assert!(add(Vec::<Profile>::new()).is_err());
        assert!(convolve(Vec::<Component>::new()).is_err());
    }
}
