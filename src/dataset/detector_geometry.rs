use nalgebra::Vector3;

use crate::constants::{Meter, Radian};
use crate::ref_system::{to_target_convention, SphericalCoords};

/// Position of a detector element in the target convention (beam along `+x`, `z` up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorPosition {
    cartesian: Vector3<f64>,
}

impl DetectorPosition {
    /// Build a position from the spherical triple stored in the file.
    ///
    /// Arguments
    /// ---------
    /// * `distance`: distance from the sample in meters
    /// * `polar`: scattering angle from the beam, in radians
    /// * `azimuthal`: angle around the beam, in radians
    pub fn from_source_spherical(distance: Meter, polar: Radian, azimuthal: Radian) -> Self {
        let target = to_target_convention(distance, polar, azimuthal);
        DetectorPosition {
            cartesian: target.to_cartesian(),
        }
    }

    pub fn cartesian(&self) -> &Vector3<f64> {
        &self.cartesian
    }

    pub fn spherical(&self) -> SphericalCoords {
        SphericalCoords::from_cartesian(&self.cartesian)
    }
}

/// Geometry attached to one spectrum, as read from its detector subtree.
///
/// `distance`, `polar` and `azimuthal` keep the file's source convention;
/// `position` holds the same point converted to the target convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorGeometry {
    pub distance: Meter,
    pub polar: Radian,
    pub azimuthal: Radian,
    pub solid_angle: Option<f64>,
    pub position: DetectorPosition,
}

impl DetectorGeometry {
    pub fn new(distance: Meter, polar: Radian, azimuthal: Radian, solid_angle: Option<f64>) -> Self {
        DetectorGeometry {
            distance,
            polar,
            azimuthal,
            solid_angle,
            position: DetectorPosition::from_source_spherical(distance, polar, azimuthal),
        }
    }
}

#[cfg(test)]
mod detector_geometry_test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_forward_detector_lies_on_target_x() {
        let geometry = DetectorGeometry::new(4.0, 0.0, 0.0, Some(0.01));
        let cart = geometry.position.cartesian();
        assert_abs_diff_eq!(cart.x, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cart.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cart.z, 0.0, epsilon = 1e-12);

        let spherical = geometry.position.spherical();
        assert_abs_diff_eq!(spherical.rho, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spherical.phi, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_distance() {
        let position = DetectorPosition::from_source_spherical(0.0, 1.0, 2.0);
        assert_eq!(position.cartesian(), &Vector3::zeros());
    }
}
