/// Affine transformation matrices applied to mesh vertices
use nalgebra::{Matrix4, Rotation3, Unit};

use crate::error::Result;
use crate::geometry::{normalized, Point, Vec3};

/// Transform builder for rigid and scaling transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation(offset: &Vec3) -> Matrix4<f64> {
        Matrix4::new_translation(offset)
    }

    /// Uniform scale by `ratio` that keeps `center` fixed.
    pub fn scale_about(center: &Point, ratio: f64) -> Matrix4<f64> {
        Self::about(center, Matrix4::new_scaling(ratio))
    }

    /// Rotation by `angle_degrees` around the axis through `center` along `axis`.
    pub fn rotation_about(center: &Point, axis: &Vec3, angle_degrees: f64) -> Result<Matrix4<f64>> {
        let axis = Unit::new_unchecked(normalized(axis)?);
        let rotation = Rotation3::from_axis_angle(&axis, angle_degrees.to_radians());
        Ok(Self::about(center, rotation.to_homogeneous()))
    }

    fn about(center: &Point, linear: Matrix4<f64>) -> Matrix4<f64> {
        Self::translation(&center.coords) * linear * Self::translation(&-center.coords)
    }
}
