//! # Detector coordinate conventions
//!
//! Detector positions are stored in the hierarchical files in the **source convention**
//! (beam along `+z`, `y` up) and consumed by the analysis layer in the **target
//! convention** (beam along `+x`, `z` up). Both describe a position by a spherical triple
//! `(rho, phi, theta)`:
//!
//! - `rho`: distance from the sample,
//! - `phi`: polar angle measured from the system's fixed `z` axis,
//! - `theta`: azimuthal angle in the perpendicular `xy` plane, measured from `+x`.
//!
//! ## Axis relabeling
//!
//! The conversion is a fixed relabeling of the Cartesian components, not a generic
//! rotation:
//!
//! ```text
//! source (x, y, z)  --to_target_convention-->    target (z, x, y)
//! target (x, y, z)  --from_target_convention-->  source (y, z, x)
//! ```
//!
//! The relabeling is cyclic and therefore **not** self-inverse; each direction carries
//! its own matrix.
//!
//! ## Degenerate inputs
//!
//! - `rho == 0` yields `(0, 0, 0)`: the polar angle is pinned to 0 instead of dividing by zero.
//! - NaN inputs propagate as NaN outputs.
use nalgebra::{Matrix3, Vector3};

use crate::constants::Radian;

/// A spherical triple `(rho, phi, theta)`.
///
/// # Fields
///
/// * `rho` - distance from the origin
/// * `phi` - polar angle from the `z` axis, in radians
/// * `theta` - azimuthal angle from the `x` axis in the `xy` plane, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoords {
    pub rho: f64,
    pub phi: Radian,
    pub theta: Radian,
}

impl SphericalCoords {
    pub fn new(rho: f64, phi: Radian, theta: Radian) -> Self {
        SphericalCoords { rho, phi, theta }
    }

    /// Cartesian point of this triple in its own axis convention.
    pub fn to_cartesian(&self) -> Vector3<f64> {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vector3::new(
            self.rho * sin_phi * cos_theta,
            self.rho * sin_phi * sin_theta,
            self.rho * cos_phi,
        )
    }

    /// Spherical triple of a Cartesian point.
    ///
    /// Arguments
    /// ---------
    /// * `point`: the Cartesian point
    ///
    /// Return
    /// ------
    /// * `phi = acos(z / rho)` (0 when `rho == 0`) and `theta = atan2(y, x)`
    pub fn from_cartesian(point: &Vector3<f64>) -> Self {
        let rho = point.norm();
        let phi = if rho == 0.0 {
            0.0
        } else {
            (point.z / rho).clamp(-1.0, 1.0).acos()
        };
        let theta = point.y.atan2(point.x);
        SphericalCoords { rho, phi, theta }
    }
}

/// Relabeling matrix from source axes to target axes: `target = M · source`.
fn source_to_target() -> Matrix3<f64> {
    Matrix3::new(
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0,
    )
}

/// Relabeling matrix from target axes to source axes: `source = M · target`.
fn target_to_source() -> Matrix3<f64> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0,
    )
}

fn relabel(rho: f64, phi: Radian, theta: Radian, matrix: Matrix3<f64>) -> SphericalCoords {
    if rho == 0.0 {
        return SphericalCoords::new(0.0, 0.0, 0.0);
    }
    let point = SphericalCoords::new(rho, phi, theta).to_cartesian();
    SphericalCoords::from_cartesian(&(matrix * point))
}

/// Convert a position from the source convention to the target convention.
///
/// Arguments
/// ---------
/// * `rho`: distance from the sample
/// * `phi`: polar angle from the source `z` axis (beam), in radians
/// * `theta`: azimuthal angle in the source `xy` plane, in radians
///
/// Return
/// ------
/// * The same physical position as a target-convention triple
///
/// See also
/// ------------
/// * [`from_target_convention`] – the inverse direction
pub fn to_target_convention(rho: f64, phi: Radian, theta: Radian) -> SphericalCoords {
    relabel(rho, phi, theta, source_to_target())
}

/// Convert a position from the target convention back to the source convention.
///
/// Arguments
/// ---------
/// * `rho`: distance from the sample
/// * `phi`: polar angle from the target `z` axis (up), in radians
/// * `theta`: azimuthal angle in the target `xy` plane, in radians
///
/// Return
/// ------
/// * The same physical position as a source-convention triple
pub fn from_target_convention(rho: f64, phi: Radian, theta: Radian) -> SphericalCoords {
    relabel(rho, phi, theta, target_to_source())
}
