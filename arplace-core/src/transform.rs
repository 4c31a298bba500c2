//! Object transforms and the matrix helpers built on them

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

/// Rotation, translation and per-axis scale of one object.
///
/// Placed transforms are absolute world-space values. They are never
/// re-expressed when the tracking reference frame changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: UnitQuaternion<f32>,
    pub translation: Point3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn from_rotation_translation_scale(
        rotation: UnitQuaternion<f32>,
        translation: Point3<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Model matrix `T * R * S`
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Self::translation_matrix(self.translation.x, self.translation.y, self.translation.z)
            * self.rotation.to_homogeneous()
            * Self::scale_matrix(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

/// Build the transform of an object standing at `point`.
pub fn compose_placement_transform(point: Point3<f32>, scale: Vector3<f32>) -> Transform {
    Transform::from_rotation_translation_scale(UnitQuaternion::identity(), point, scale)
}

/// Squash clip-space Z so geometry close to the viewer survives the
/// host's near plane. Applied on the left of the host projection.
pub fn depth_corrected(projection: &Matrix4<f32>, z_scale: f32) -> Matrix4<f32> {
    Transform::scale_matrix(1.0, 1.0, z_scale) * projection
}
