//! Points on the celestial sphere.

use nalgebra::Vector3;

use crate::units::{Angle, AngleExt};

/// An (RA, Dec) position on the celestial sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialCoord {
    ra: Angle,
    dec: Angle,
}

impl CelestialCoord {
    pub fn new(ra: Angle, dec: Angle) -> Self {
        Self { ra, dec }
    }

    /// The north celestial pole.
    pub fn north_pole() -> Self {
        Self::new(Angle::from_degrees(0.0), Angle::from_degrees(90.0))
    }

    pub fn ra(&self) -> Angle {
        self.ra
    }

    pub fn dec(&self) -> Angle {
        self.dec
    }

    fn unit_vector(&self) -> Vector3<f64> {
        let (sin_ra, cos_ra) = self.ra.as_radians().sin_cos();
        let (sin_dec, cos_dec) = self.dec.as_radians().sin_cos();
        Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    /// Great-circle distance to `other`.
    pub fn distance_to(&self, other: &CelestialCoord) -> Angle {
        let a = self.unit_vector();
        let b = other.unit_vector();
        Angle::from_radians(a.cross(&b).norm().atan2(a.dot(&b)))
    }

    /// Angle at this point from the great circle towards `first` to the one
    /// towards `second`, positive when the sweep is counter-clockwise as seen
    /// from Earth.
    pub fn angle_between(&self, first: &CelestialCoord, second: &CelestialCoord) -> Angle {
        let p = self.unit_vector();
        let b = first.unit_vector();
        let c = second.unit_vector();
        let t1 = b - p * p.dot(&b);
        let t2 = c - p * p.dot(&c);
        // Looking out from the centre reverses the handedness of the outward normal
        Angle::from_radians((-p.dot(&t1.cross(&t2))).atan2(t1.dot(&t2)))
    }
}
